//! ELM327 adapter over TCP (Wi-Fi dongles) or a serial device node.
//!
//! # Protocol
//!
//! Commands are ASCII lines terminated by `\r`. The adapter answers with zero
//! or more lines and then the `>` prompt. With echo, spaces and headers turned
//! off a mode 01 answer looks like:
//!
//! ```text
//! 010C\r        ->  410C1AF8\r\r>
//! 0146\r        ->  NO DATA\r\r>
//! 03\r          ->  43020171042 0\r\r>          (CAN: count byte, pairs)
//! 03\r          ->  00A\r0:43040171042003\r1:01030000000000\r\r>   (multi-frame)
//! ```
//!
//! # Initialization
//!
//! `ATZ` (reset), `ATE0` (echo off), `ATL0` (linefeeds off), `ATS0` (spaces
//! off), `ATH0` (headers off), `ATSP0` (automatic protocol), then a `0100`
//! request that makes the adapter search for and lock onto the vehicle bus.
//!
//! # Timeouts
//!
//! TCP transports get the configured read/write timeout, which bounds every
//! query. Device nodes (`/dev/rfcomm0`, `/dev/ttyUSB0`) are opened as plain
//! files and rely on the line discipline configured outside the program.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::dtc::{decode_mode03, decode_mode03_counted};
use super::{Connector, Dtc, ObdConnection, Pid};
use crate::error::ObdError;

/// Prompt byte ending every response.
const PROMPT: u8 = b'>';

/// Upper bound on a single response; anything longer is a runaway stream.
const MAX_RESPONSE_LEN: usize = 4096;

/// Sent in order after opening the transport.
const INIT_COMMANDS: [&str; 6] = ["ATZ", "ATE0", "ATL0", "ATS0", "ATH0", "ATSP0"];

/// Substrings marking an adapter-side failure.
const ERROR_MARKERS: [&str; 9] = [
    "UNABLE TO CONNECT",
    "CAN ERROR",
    "BUS ERROR",
    "BUS BUSY",
    "BUFFER FULL",
    "DATA ERROR",
    "STOPPED",
    "FB ERROR",
    "ERROR",
];

// =============================================================================
// Transport and Connector
// =============================================================================

/// Where the ELM327 lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transport {
    /// `host:port` of a Wi-Fi adapter, typically `192.168.0.10:35000`.
    Tcp(String),
    /// Pre-configured serial device node.
    Device(PathBuf),
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(address) => write!(f, "tcp://{address}"),
            Self::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Opens and initializes ELM327 connections.
pub struct Elm327Connector {
    transport: Transport,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Elm327Connector {
    pub const fn new(transport: Transport, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self { transport, connect_timeout, read_timeout }
    }

    fn open_tcp(&self, address: &str) -> Result<TcpStream, ObdError> {
        let mut last_err = None;
        for addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.read_timeout))?;
                    stream.set_write_timeout(Some(self.read_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(%addr, error = %e, "TCP connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.map_or_else(
            || ObdError::Malformed(format!("address '{address}' resolved to nothing")),
            ObdError::from_io,
        ))
    }
}

impl Connector for Elm327Connector {
    fn connect(&self) -> Result<Box<dyn ObdConnection>, ObdError> {
        let connection: Box<dyn ObdConnection> = match &self.transport {
            Transport::Tcp(address) => Box::new(Elm327::initialize(self.open_tcp(address)?)?),
            Transport::Device(path) => {
                let file = OpenOptions::new().read(true).write(true).open(path)?;
                Box::new(Elm327::initialize(file)?)
            }
        };
        info!(transport = %self.transport, "ELM327 initialized");
        Ok(connection)
    }

    fn describe(&self) -> String {
        format!("elm327 {}", self.transport)
    }
}

// =============================================================================
// Connection
// =============================================================================

/// An initialized ELM327 session over any byte stream.
pub struct Elm327<T> {
    io: Option<T>,
    buf: Vec<u8>,
}

impl<T: Read + Write + Send> Elm327<T> {
    /// Wrap a transport without sending anything.
    pub fn new(io: T) -> Self {
        Self { io: Some(io), buf: Vec::with_capacity(256) }
    }

    /// Run the init sequence and confirm the vehicle bus answers.
    pub fn initialize(io: T) -> Result<Self, ObdError> {
        let mut elm = Self::new(io);
        for cmd in INIT_COMMANDS {
            let lines = elm.command(cmd)?;
            if cmd != "ATZ" {
                check_errors(&lines)?;
            } else if let Some(version) = lines.last() {
                debug!(version = %version, "adapter reset");
            }
        }

        let lines = elm.command(Pid::SUPPORTED_01_20.command().as_str())?;
        check_errors(&lines)?;
        if is_no_data(&lines) {
            return Err(ObdError::Adapter("NO DATA".into()));
        }
        Ok(elm)
    }

    /// Send one command and collect the non-empty response lines.
    ///
    /// Echo lines and `SEARCHING...` progress lines are dropped. A failed
    /// exchange ends the session: a late reply would otherwise be read as the
    /// answer to the next command, so later calls return [`ObdError::Closed`].
    pub fn command(&mut self, cmd: &str) -> Result<Vec<String>, ObdError> {
        if let Err(e) = self.exchange(cmd) {
            if self.io.take().is_some() {
                warn!(command = cmd, error = %e, "ELM327 exchange failed, dropping session");
            }
            return Err(e);
        }

        let text = String::from_utf8_lossy(&self.buf);
        Ok(text
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != cmd && !line.starts_with("SEARCHING"))
            .map(str::to_owned)
            .collect())
    }

    /// Write `cmd` and read up to the prompt into `buf`.
    fn exchange(&mut self, cmd: &str) -> Result<(), ObdError> {
        let io = self.io.as_mut().ok_or(ObdError::Closed)?;
        io.write_all(cmd.as_bytes())
            .and_then(|()| io.write_all(b"\r"))
            .and_then(|()| io.flush())
            .map_err(ObdError::from_io)?;

        self.buf.clear();
        let mut chunk = [0u8; 256];
        loop {
            let n = io.read(&mut chunk).map_err(ObdError::from_io)?;
            if n == 0 {
                return Err(ObdError::Closed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = self.buf.iter().position(|&b| b == PROMPT) {
                self.buf.truncate(end);
                return Ok(());
            }
            if self.buf.len() > MAX_RESPONSE_LEN {
                return Err(ObdError::Malformed(format!("no prompt after {MAX_RESPONSE_LEN} bytes")));
            }
        }
    }
}

impl<T: Read + Write + Send> ObdConnection for Elm327<T> {
    fn query(&mut self, pid: Pid) -> Result<Option<f32>, ObdError> {
        let lines = self.command(pid.command().as_str())?;
        check_errors(&lines)?;
        if is_no_data(&lines) {
            return Ok(None);
        }
        for message in messages(&lines) {
            if let [0x41, echoed, data @ ..] = message.bytes.as_slice()
                && *echoed == pid.0
            {
                return pid
                    .decode(data)
                    .map(Some)
                    .ok_or_else(|| ObdError::Malformed(format!("short payload for PID {:02X}: {data:02X?}", pid.0)));
            }
        }
        Err(ObdError::Malformed(format!("no answer to PID {:02X} in {lines:?}", pid.0)))
    }

    fn query_dtc(&mut self) -> Result<Vec<Dtc>, ObdError> {
        let lines = self.command("03")?;
        check_errors(&lines)?;
        if is_no_data(&lines) {
            return Ok(Vec::new());
        }
        let mut codes: Vec<Dtc> = Vec::new();
        let mut answered = false;
        for message in messages(&lines) {
            if message.bytes.first() != Some(&0x43) {
                continue;
            }
            answered = true;
            let decoded = if message.multi_frame {
                decode_mode03_counted(&message.bytes)
            } else {
                decode_mode03(&message.bytes)
            };
            for dtc in decoded {
                // Several ECUs may report the same code
                if !codes.contains(&dtc) {
                    codes.push(dtc);
                }
            }
        }
        if !answered {
            return Err(ObdError::Malformed(format!("no mode 03 answer in {lines:?}")));
        }
        Ok(codes)
    }

    fn close(&mut self) {
        if self.io.take().is_some() {
            debug!("ELM327 transport closed");
        }
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// One decoded response message.
#[derive(Debug, PartialEq, Eq)]
struct Message {
    bytes: Vec<u8>,
    /// Reassembled from `N:`-indexed CAN frames.
    multi_frame: bool,
}

fn check_errors(lines: &[String]) -> Result<(), ObdError> {
    for line in lines {
        let upper = line.to_ascii_uppercase();
        if line == "?" || ERROR_MARKERS.iter().any(|marker| upper.contains(marker)) {
            return Err(ObdError::Adapter(line.clone()));
        }
    }
    Ok(())
}

fn is_no_data(lines: &[String]) -> bool {
    lines.iter().any(|line| line.eq_ignore_ascii_case("NO DATA"))
}

/// Split response lines into messages.
///
/// Plain hex lines are one message each (one per answering ECU). Lines
/// prefixed with a frame index (`0:`, `1:`, ...) are concatenated into a
/// single multi-frame message. Anything else (byte-count headers such as
/// `00A`, `OK`, `BUS INIT: ...OK`) is skipped.
fn messages(lines: &[String]) -> Vec<Message> {
    let mut out = Vec::new();
    let mut frames: Vec<u8> = Vec::new();
    for line in lines {
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some((index, payload)) = compact.split_once(':')
            && !index.is_empty()
            && index.len() <= 2
            && index.chars().all(|c| c.is_ascii_hexdigit())
        {
            if let Some(bytes) = decode_hex(payload) {
                frames.extend(bytes);
            }
            continue;
        }
        if let Some(bytes) = decode_hex(&compact) {
            out.push(Message { bytes, multi_frame: false });
        }
    }
    if !frames.is_empty() {
        out.push(Message { bytes: frames, multi_frame: true });
    }
    out
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || text.len() % 2 != 0 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;

    /// In-memory adapter: each `\r`-terminated command pops the next scripted
    /// reply (followed by the prompt) into the read side.
    struct ScriptedTransport {
        replies: VecDeque<&'static str>,
        written: Vec<u8>,
        pending: VecDeque<u8>,
        /// Reads that fail with `TimedOut` before pending bytes are served.
        timeouts: usize,
    }

    impl ScriptedTransport {
        fn new(replies: &[&'static str]) -> Self {
            Self { replies: replies.iter().copied().collect(), written: Vec::new(), pending: VecDeque::new(), timeouts: 0 }
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            for _ in buf.iter().filter(|&&b| b == b'\r') {
                if let Some(reply) = self.replies.pop_front() {
                    self.pending.extend(reply.bytes());
                    self.pending.extend(b"\r\r>");
                }
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.timeouts > 0 {
                self.timeouts -= 1;
                return Err(io::ErrorKind::TimedOut.into());
            }
            let n = buf.len().min(self.pending.len()).min(7); // small reads exercise reassembly
            for slot in buf.iter_mut().take(n) {
                *slot = self.pending.pop_front().unwrap_or(b'>');
            }
            Ok(n)
        }
    }

    const INIT_REPLIES: [&str; 7] = ["ATZ\r\r\rELM327 v1.5", "OK", "OK", "OK", "OK", "OK", "SEARCHING...\r4100BE1FA813"];

    fn connected(extra: &[&'static str]) -> Elm327<ScriptedTransport> {
        let mut replies = INIT_REPLIES.to_vec();
        replies.extend_from_slice(extra);
        Elm327::initialize(ScriptedTransport::new(&replies)).unwrap()
    }

    fn written(elm: &Elm327<ScriptedTransport>) -> String {
        String::from_utf8(elm.io.as_ref().unwrap().written.clone()).unwrap()
    }

    #[test]
    fn test_initialize_sends_sequence() {
        let elm = connected(&[]);
        assert_eq!(written(&elm), "ATZ\rATE0\rATL0\rATS0\rATH0\rATSP0\r0100\r");
    }

    #[test]
    fn test_initialize_fails_without_vehicle() {
        let mut replies = INIT_REPLIES[..6].to_vec();
        replies.push("SEARCHING...\rUNABLE TO CONNECT");
        let result = Elm327::initialize(ScriptedTransport::new(&replies));
        assert!(matches!(result, Err(ObdError::Adapter(ref line)) if line == "UNABLE TO CONNECT"));
    }

    #[test]
    fn test_query_rpm() {
        let mut elm = connected(&["410C1AF8"]);
        assert_eq!(elm.query(Pid::RPM).unwrap(), Some(1726.0));
        assert!(written(&elm).ends_with("010C\r"));
    }

    #[test]
    fn test_query_with_spaces_and_multiple_ecus() {
        let mut elm = connected(&["41 0D 64\r41 0D 64"]);
        assert_eq!(elm.query(Pid::SPEED).unwrap(), Some(100.0));
    }

    #[test]
    fn test_query_no_data_is_null_reading() {
        let mut elm = connected(&["NO DATA"]);
        assert_eq!(elm.query(Pid::OIL_TEMP).unwrap(), None);
    }

    #[test]
    fn test_query_adapter_errors() {
        let mut elm = connected(&["?", "CAN ERROR", "STOPPED"]);
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Adapter(ref l)) if l == "?"));
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Adapter(ref l)) if l == "CAN ERROR"));
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Adapter(_))));
    }

    #[test]
    fn test_query_mismatched_pid_is_malformed() {
        let mut elm = connected(&["410D64"]);
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Malformed(_))));
    }

    #[test]
    fn test_query_short_payload_is_malformed() {
        let mut elm = connected(&["410C1A"]);
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Malformed(_))));
    }

    #[test]
    fn test_query_dtc_single_frame() {
        let mut elm = connected(&["4302017104200000"]);
        let codes = elm.query_dtc().unwrap();
        let names: Vec<_> = codes.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(names, ["P0171", "P0420"]);
        assert_eq!(codes[0].to_string(), "P0171: System Too Lean (Bank 1)");
    }

    #[test]
    fn test_query_dtc_multi_frame() {
        let mut elm = connected(&["00A\r0:43040171042003\r1:01030000000000"]);
        let names: Vec<_> = elm.query_dtc().unwrap().into_iter().map(|d| d.code).collect();
        assert_eq!(names, ["P0171", "P0420", "P0301", "P0300"]);
    }

    #[test]
    fn test_query_dtc_none_stored() {
        let mut elm = connected(&["NO DATA", "4300"]);
        assert!(elm.query_dtc().unwrap().is_empty());
        assert!(elm.query_dtc().unwrap().is_empty());
    }

    #[test]
    fn test_query_dtc_deduplicates_ecus() {
        let mut elm = connected(&["43010171\r43010171"]);
        assert_eq!(elm.query_dtc().unwrap().len(), 1);
    }

    #[test]
    fn test_query_dtc_without_mode03_answer_is_malformed() {
        let mut elm = connected(&["410D64", "OK"]);
        assert!(matches!(elm.query_dtc(), Err(ObdError::Malformed(_))));
        assert!(matches!(elm.query_dtc(), Err(ObdError::Malformed(_))));
    }

    #[test]
    fn test_timeout_drops_session() {
        // The RPM reply arrives late; nothing after it may read it as its own answer
        let mut elm = connected(&["410C1AF8", "410D64", "4302017104200000"]);
        elm.io.as_mut().unwrap().timeouts = 1;

        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Timeout)));
        assert!(elm.io.is_none());
        assert!(matches!(elm.query(Pid::SPEED), Err(ObdError::Closed)));
        assert!(matches!(elm.query_dtc(), Err(ObdError::Closed)));
    }

    #[test]
    fn test_eof_mid_response_is_closed() {
        // Script runs out: the query gets no reply at all
        let mut elm = connected(&[]);
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Closed)));
    }

    #[test]
    fn test_close_rejects_further_queries() {
        let mut elm = connected(&["410C1AF8"]);
        elm.close();
        assert!(matches!(elm.query(Pid::RPM), Err(ObdError::Closed)));
    }

    #[test]
    fn test_messages_skip_non_hex() {
        let lines: Vec<String> = ["BUS INIT: ...OK", "OK", "410C1AF8"].iter().map(|s| (*s).to_owned()).collect();
        let parsed = messages(&lines);
        assert_eq!(parsed, vec![Message { bytes: vec![0x41, 0x0C, 0x1A, 0xF8], multi_frame: false }]);
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("410C"), Some(vec![0x41, 0x0C]));
        assert_eq!(decode_hex("41C"), None);
        assert_eq!(decode_hex("ZZ"), None);
        assert_eq!(decode_hex(""), None);
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(Transport::Tcp("192.168.0.10:35000".into()).to_string(), "tcp://192.168.0.10:35000");
        assert_eq!(Transport::Device("/dev/rfcomm0".into()).to_string(), "/dev/rfcomm0");
    }
}
