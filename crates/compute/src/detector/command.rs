use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use super::{DetectionRequest, DetectionScores, Detector, DetectorError};

/// How often a running detector process is checked against its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shapes accepted on the detector program's stdout.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoresOutput {
    Named(DetectionScores),
    Triple([f64; 3]),
}

impl From<ScoresOutput> for DetectionScores {
    fn from(out: ScoresOutput) -> Self {
        match out {
            ScoresOutput::Named(scores) => scores,
            ScoresOutput::Triple([precision, recall, f1]) => {
                DetectionScores::new(precision, recall, f1)
            }
        }
    }
}

/// Runs an external program once per series.
///
/// The [`DetectionRequest`] is written to the program's stdin as JSON. The
/// last non-empty line of stdout must be either
/// `{"precision": .., "recall": .., "f1": ..}` or `[precision, recall, f1]`;
/// earlier lines are ignored so the program may log freely.
///
/// When the request carries a timeout the process is killed and reaped
/// once it expires.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Read a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_pipe(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, DetectorError> {
    handle
        .join()
        .map_err(|_| DetectorError::Panicked("pipe reader thread panicked".into()))?
        .map_err(DetectorError::from)
}

/// Wait for the child, giving up at the deadline. `None` means it is still
/// running.
fn wait_until(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

impl Detector for CommandDetector {
    fn name(&self) -> &str {
        &self.program
    }

    fn detect(&self, request: &DetectionRequest) -> Result<DetectionScores, DetectorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut payload = serde_json::to_vec(request)?;
        payload.push(b'\n');
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || -> io::Result<()> {
            match stdin {
                // A program that exits without reading its input closes the pipe.
                Some(mut stdin) => match stdin.write_all(&payload) {
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                },
                None => Ok(()),
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_until(&mut child, request.timeout)? {
            Some(status) => status,
            None => {
                let limit = request.timeout.unwrap_or_default();
                if let Err(e) = child.kill() {
                    warn!(program = %self.program, error = %e, "failed to kill timed-out detector");
                }
                child.wait()?;
                warn!(program = %self.program, metric = %request.metric_name, ?limit, "detector process killed at deadline");
                return Err(DetectorError::TimedOut(limit));
            }
        };

        writer
            .join()
            .map_err(|_| DetectorError::Panicked("stdin writer thread panicked".into()))??;
        let stdout = join_pipe(stdout)?;
        let stderr = join_pipe(stderr)?;

        if !status.success() {
            return Err(DetectorError::Command {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&stdout);
        let last = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| DetectorError::Failed(format!("`{}` printed no scores", self.program)))?;

        let scores: DetectionScores = serde_json::from_str::<ScoresOutput>(last)?.into();
        debug!(program = %self.program, metric = %request.metric_name, f1 = scores.f1, "command detector returned");
        Ok(scores)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use metricbench_core::DetectionParams;
    use std::path::PathBuf;

    fn request() -> DetectionRequest {
        DetectionRequest {
            metric_name: "real_1".into(),
            params: DetectionParams::new(5, 99),
            train: vec![1.0, 2.0],
            test: vec![3.0],
            test_labels: vec![1],
            pattern_path: PathBuf::from("p.json"),
            figure_path: PathBuf::from("f.png"),
            timeout: None,
        }
    }

    fn sh(script: &str) -> CommandDetector {
        CommandDetector::new("sh").with_args(["-c", script])
    }

    fn is_alive(pid: &str) -> bool {
        Command::new("kill")
            .args(["-0", pid])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn reads_named_scores_from_last_line() {
        let det = sh(r#"cat > /dev/null; echo "training..."; echo '{"precision": 1, "recall": 0.5, "f1": 0.25}'"#);
        let scores = det.detect(&request()).unwrap();
        assert_eq!(scores, DetectionScores::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn reads_array_scores() {
        let det = sh("cat > /dev/null; echo '[0.5, 0.5, 0.5]'");
        assert_eq!(det.detect(&request()).unwrap(), DetectionScores::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn request_is_sent_as_json() {
        let det = sh(r#"grep -q '"metric_name":"real_1"' && echo '[1, 1, 1]'"#);
        assert_eq!(det.detect(&request()).unwrap(), DetectionScores::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn non_zero_exit_is_command_error() {
        let det = sh("cat > /dev/null; echo nope >&2; exit 3");
        let err = det.detect(&request()).unwrap_err();
        assert!(matches!(err, DetectorError::Command { ref stderr, .. } if stderr == "nope"));
    }

    #[test]
    fn unparsable_output_is_json_error() {
        let det = sh("cat > /dev/null; echo 'done'");
        assert!(matches!(det.detect(&request()), Err(DetectorError::Json(_))));
    }

    #[test]
    fn finishes_within_generous_timeout() {
        let mut req = request();
        req.timeout = Some(Duration::from_secs(10));
        let det = sh("cat > /dev/null; echo '[1, 0, 0]'");
        assert_eq!(det.detect(&req).unwrap(), DetectionScores::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn expired_deadline_kills_the_process() {
        let tmp = tempfile::tempdir().unwrap();
        let pid_file = tmp.path().join("pid");
        let script = format!("echo $$ > {}; exec sleep 7", pid_file.display());

        let mut req = request();
        req.timeout = Some(Duration::from_millis(200));
        let started = Instant::now();
        let err = sh(&script).detect(&req).unwrap_err();

        assert!(matches!(err, DetectorError::TimedOut(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!is_alive(pid.trim()), "detector process {} still running", pid.trim());
    }
}
