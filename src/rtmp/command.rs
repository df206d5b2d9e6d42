// RTMP command

use std::{collections::HashMap, sync::LazyLock};

use crate::amf::{AMF0Value, AMFDecodingCursor};

/// RTMP command, with its arguments indexed by name
#[derive(Clone, Debug, PartialEq)]
pub struct RtmpCommand {
    /// Command
    pub cmd: String,

    /// Arguments
    pub arguments: HashMap<String, AMF0Value>,
}

/// Ordered argument names for each known command
static RTMP_COMMAND_CODES: LazyLock<HashMap<&'static str, Vec<&'static str>>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert("_result", vec!["transId", "cmdObj", "info"]);
        m.insert("_error", vec!["transId", "cmdObj", "info", "streamId"]);
        m.insert("onStatus", vec!["transId", "cmdObj", "info"]);
        m.insert("connect", vec!["transId", "cmdObj", "args"]);
        m.insert("createStream", vec!["transId", "cmdObj"]);
        m.insert("deleteStream", vec!["transId", "cmdObj", "streamId"]);
        m.insert("onBWDone", vec!["transId", "cmdObj"]);
        m.insert(
            "play",
            vec!["transId", "cmdObj", "streamName", "start", "duration", "reset"],
        );
        m.insert("publish", vec!["transId", "cmdObj", "streamName", "type"]);

        m
    });

impl RtmpCommand {
    /// Creates RtmpCommand
    pub fn new(cmd: &str) -> RtmpCommand {
        RtmpCommand {
            cmd: cmd.to_string(),
            arguments: HashMap::new(),
        }
    }

    /// Sets argument
    pub fn set_argument(&mut self, arg_name: &str, value: AMF0Value) {
        self.arguments.insert(arg_name.to_string(), value);
    }

    /// Gets argument
    pub fn get_argument(&self, arg_name: &str) -> Option<&AMF0Value> {
        self.arguments.get(arg_name)
    }

    /// Gets the transaction ID, 0 if not present
    pub fn transaction_id(&self) -> f64 {
        match self.get_argument("transId") {
            Some(t) => t.get_float(),
            None => 0.0,
        }
    }

    /// Gets string representation of the command for debug logging
    pub fn to_debug_string(&self) -> String {
        let mut s = format!("{} {{\n", self.cmd);

        let mut names: Vec<&String> = self.arguments.keys().collect();
        names.sort();

        for arg_name in names {
            s.push_str(&format!(
                "    '{}' = {}\n",
                arg_name,
                self.arguments[arg_name].to_debug_string("    ")
            ));
        }

        s.push('}');

        s
    }

    /// Encodes command
    /// Missing arguments are encoded as undefined,
    /// trailing ones are omitted
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = AMF0Value::string(&self.cmd).encode();

        if let Some(arg_list) = RTMP_COMMAND_CODES.get(self.cmd.as_str()) {
            let present = arg_list
                .iter()
                .rposition(|arg_name| self.arguments.contains_key(*arg_name))
                .map(|i| i + 1)
                .unwrap_or(0);

            for arg_name in &arg_list[..present] {
                match self.arguments.get(*arg_name) {
                    Some(val) => buf.extend(val.encode()),
                    None => buf.extend(AMF0Value::Undefined.encode()),
                }
            }
        }

        buf
    }

    /// Decodes command from bytes
    /// For unknown commands only the transaction ID is decoded
    pub fn decode(data: &[u8]) -> Result<RtmpCommand, ()> {
        let mut cursor = AMFDecodingCursor::new(data);

        let cmd_amf = AMF0Value::read(&mut cursor)?;

        let mut c = RtmpCommand::new(cmd_amf.get_string());

        let arg_list: &[&str] = match RTMP_COMMAND_CODES.get(c.cmd.as_str()) {
            Some(l) => l,
            None => &["transId"],
        };

        for arg_name in arg_list {
            if cursor.ended() {
                break;
            }

            let val = AMF0Value::read(&mut cursor)?;

            c.set_argument(arg_name, val);
        }

        Ok(c)
    }
}

// Tests
