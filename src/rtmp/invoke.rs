// Typed view of the RTMP commands used by the client workflow

use url::form_urlencoded;

use crate::amf::AMF0Value;

use super::{RtmpCommand, LEVEL_STATUS, PUBLISH_TYPE_LIVE};

/// A decoded command message
///
/// The variant is picked by the command name and the shape of its
/// arguments. Anything the client workflow does not act on decodes
/// to `Unrecognized`.
#[derive(Clone, Debug, PartialEq)]
pub enum RtmpInvoke {
    Connect {
        transaction_id: f64,
        app: String,
        flash_version: String,
        swf_url: String,
        tc_url: String,
    },
    CreateStream {
        transaction_id: f64,
    },
    Publish {
        transaction_id: f64,
        stream_name: String,
        publish_type: String,
    },
    Play {
        transaction_id: f64,
        stream_name: String,
        arguments: Vec<(String, String)>,
    },
    /// `_result` or `_error` carrying an information object
    GenericResult {
        transaction_id: f64,
        is_error: bool,
        code: String,
        description: String,
    },
    /// `_result` carrying the ID of a newly created stream
    CreateStreamResult {
        transaction_id: f64,
        stream_id: u32,
    },
    /// `onStatus` about a publish request
    PublishResult {
        code: String,
        level: String,
        description: String,
    },
    /// `onStatus` about a play request
    PlayResult {
        code: String,
        level: String,
        description: String,
    },
    Unrecognized {
        name: String,
    },
}

/// Reads the information object of a result or status command
fn read_info(cmd: &RtmpCommand) -> (String, String, String) {
    let info = cmd.get_argument("info");

    let field = |name: &str| -> String {
        info.and_then(|i| i.get_object_string(name))
            .unwrap_or("")
            .to_string()
    };

    (field("code"), field("level"), field("description"))
}

/// Joins a stream name with its play arguments, as an urlencoded query
fn join_stream_name(stream_name: &str, arguments: &[(String, String)]) -> String {
    if arguments.is_empty() {
        return stream_name.to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(arguments)
        .finish();

    format!("{}?{}", stream_name, query)
}

/// Splits a stream name from its play arguments
fn split_stream_name(full_name: &str) -> (String, Vec<(String, String)>) {
    match full_name.split_once('?') {
        Some((name, query)) => {
            let arguments = form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();

            (name.to_string(), arguments)
        }
        None => (full_name.to_string(), Vec::new()),
    }
}

impl RtmpInvoke {
    /// Decodes a command message payload
    pub fn decode(payload: &[u8]) -> RtmpInvoke {
        match RtmpCommand::decode(payload) {
            Ok(cmd) => Self::from_command(&cmd),
            Err(()) => RtmpInvoke::Unrecognized {
                name: String::new(),
            },
        }
    }

    /// Picks the variant for a decoded command
    pub fn from_command(cmd: &RtmpCommand) -> RtmpInvoke {
        let transaction_id = cmd.transaction_id();

        match cmd.cmd.as_str() {
            "_result" | "_error" => {
                let is_error = cmd.cmd == "_error";

                match cmd.get_argument("info") {
                    Some(info) if info.is_number() && !is_error => {
                        match u32::try_from(info.get_integer()) {
                            Ok(stream_id) => RtmpInvoke::CreateStreamResult {
                                transaction_id,
                                stream_id,
                            },
                            // Not a usable stream id
                            Err(_) => RtmpInvoke::Unrecognized {
                                name: cmd.cmd.clone(),
                            },
                        }
                    }
                    _ => {
                        let (code, _, description) = read_info(cmd);

                        RtmpInvoke::GenericResult {
                            transaction_id,
                            is_error,
                            code,
                            description,
                        }
                    }
                }
            }
            "onStatus" => {
                let (code, level, description) = read_info(cmd);

                if code.starts_with("NetStream.Publish.") || code.starts_with("NetStream.Unpublish")
                {
                    RtmpInvoke::PublishResult {
                        code,
                        level,
                        description,
                    }
                } else if code.starts_with("NetStream.Play.") {
                    RtmpInvoke::PlayResult {
                        code,
                        level,
                        description,
                    }
                } else {
                    RtmpInvoke::Unrecognized {
                        name: cmd.cmd.clone(),
                    }
                }
            }
            "connect" => {
                let cmd_obj = cmd.get_argument("cmdObj");
                let field = |name: &str| -> String {
                    cmd_obj
                        .and_then(|o| o.get_object_string(name))
                        .unwrap_or("")
                        .to_string()
                };

                RtmpInvoke::Connect {
                    transaction_id,
                    app: field("app"),
                    flash_version: field("flashVer"),
                    swf_url: field("swfUrl"),
                    tc_url: field("tcUrl"),
                }
            }
            "createStream" => RtmpInvoke::CreateStream { transaction_id },
            "publish" => RtmpInvoke::Publish {
                transaction_id,
                stream_name: cmd
                    .get_argument("streamName")
                    .map(|v| v.get_string().to_string())
                    .unwrap_or_default(),
                publish_type: cmd
                    .get_argument("type")
                    .map(|v| v.get_string().to_string())
                    .unwrap_or_default(),
            },
            "play" => {
                let full_name = cmd
                    .get_argument("streamName")
                    .map(|v| v.get_string())
                    .unwrap_or("");

                let (stream_name, arguments) = split_stream_name(full_name);

                RtmpInvoke::Play {
                    transaction_id,
                    stream_name,
                    arguments,
                }
            }
            _ => RtmpInvoke::Unrecognized {
                name: cmd.cmd.clone(),
            },
        }
    }

    /// Builds the named-argument command for this value
    pub fn to_command(&self) -> RtmpCommand {
        match self {
            RtmpInvoke::Connect {
                transaction_id,
                app,
                flash_version,
                swf_url,
                tc_url,
            } => {
                let mut cmd = RtmpCommand::new("connect");

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument(
                    "cmdObj",
                    AMF0Value::object(vec![
                        ("app", AMF0Value::string(app)),
                        ("flashVer", AMF0Value::string(flash_version)),
                        ("swfUrl", AMF0Value::string(swf_url)),
                        ("tcUrl", AMF0Value::string(tc_url)),
                        ("fpad", AMF0Value::Bool { value: false }),
                        ("capabilities", AMF0Value::number(15.0)),
                        ("audioCodecs", AMF0Value::number(3191.0)),
                        ("videoCodecs", AMF0Value::number(252.0)),
                        ("videoFunction", AMF0Value::number(1.0)),
                        ("objectEncoding", AMF0Value::number(0.0)),
                    ]),
                );

                cmd
            }
            RtmpInvoke::CreateStream { transaction_id } => {
                let mut cmd = RtmpCommand::new("createStream");

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument("cmdObj", AMF0Value::Null);

                cmd
            }
            RtmpInvoke::Publish {
                transaction_id,
                stream_name,
                publish_type,
            } => {
                let mut cmd = RtmpCommand::new("publish");

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument("cmdObj", AMF0Value::Null);
                cmd.set_argument("streamName", AMF0Value::string(stream_name));
                cmd.set_argument("type", AMF0Value::string(publish_type));

                cmd
            }
            RtmpInvoke::Play {
                transaction_id,
                stream_name,
                arguments,
            } => {
                let mut cmd = RtmpCommand::new("play");

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument("cmdObj", AMF0Value::Null);
                cmd.set_argument(
                    "streamName",
                    AMF0Value::string(&join_stream_name(stream_name, arguments)),
                );
                cmd.set_argument("start", AMF0Value::number(-2.0));

                cmd
            }
            RtmpInvoke::GenericResult {
                transaction_id,
                is_error,
                code,
                description,
            } => {
                let mut cmd = RtmpCommand::new(if *is_error { "_error" } else { "_result" });

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument("cmdObj", AMF0Value::Null);
                cmd.set_argument(
                    "info",
                    AMF0Value::object(vec![
                        ("level", AMF0Value::string(LEVEL_STATUS)),
                        ("code", AMF0Value::string(code)),
                        ("description", AMF0Value::string(description)),
                    ]),
                );

                cmd
            }
            RtmpInvoke::CreateStreamResult {
                transaction_id,
                stream_id,
            } => {
                let mut cmd = RtmpCommand::new("_result");

                cmd.set_argument("transId", AMF0Value::number(*transaction_id));
                cmd.set_argument("cmdObj", AMF0Value::Null);
                cmd.set_argument("info", AMF0Value::number(*stream_id as f64));

                cmd
            }
            RtmpInvoke::PublishResult {
                code,
                level,
                description,
            }
            | RtmpInvoke::PlayResult {
                code,
                level,
                description,
            } => {
                let mut cmd = RtmpCommand::new("onStatus");

                cmd.set_argument("transId", AMF0Value::number(0.0));
                cmd.set_argument("cmdObj", AMF0Value::Null);
                cmd.set_argument(
                    "info",
                    AMF0Value::object(vec![
                        ("level", AMF0Value::string(level)),
                        ("code", AMF0Value::string(code)),
                        ("description", AMF0Value::string(description)),
                    ]),
                );

                cmd
            }
            RtmpInvoke::Unrecognized { name } => RtmpCommand::new(name),
        }
    }

    /// Encodes the command message payload
    pub fn encode(&self) -> Vec<u8> {
        self.to_command().encode()
    }

    /// Creates a live publish request
    pub fn live_publish(transaction_id: f64, stream_name: &str) -> RtmpInvoke {
        RtmpInvoke::Publish {
            transaction_id,
            stream_name: stream_name.to_string(),
            publish_type: PUBLISH_TYPE_LIVE.to_string(),
        }
    }
}

// Tests
