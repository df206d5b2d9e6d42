// AMF0 value

use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

use super::AMFDecodingCursor;

const AMF0_TYPE_NUMBER: u8 = 0x00;
const AMF0_TYPE_BOOL: u8 = 0x01;
const AMF0_TYPE_STRING: u8 = 0x02;
const AMF0_TYPE_OBJECT: u8 = 0x03;
const AMF0_TYPE_NULL: u8 = 0x05;
const AMF0_TYPE_UNDEFINED: u8 = 0x06;
const AMF0_TYPE_REF: u8 = 0x07;
const AMF0_TYPE_ARRAY: u8 = 0x08;
const AMF0_TYPE_OBJECT_END: u8 = 0x09;
const AMF0_TYPE_STRICT_ARRAY: u8 = 0x0A;
const AMF0_TYPE_DATE: u8 = 0x0B;
const AMF0_TYPE_LONG_STRING: u8 = 0x0C;
const AMF0_TYPE_XML_DOC: u8 = 0x0F;
const AMF0_TYPE_TYPED_OBJ: u8 = 0x10;

const AMF0_OBJECT_TERM_CODE: u8 = 0x09;

/// Max nesting of objects and arrays accepted by the decoder
const AMF0_MAX_DEPTH: usize = 32;

/// AMF0 compatible value
#[derive(Clone, Debug, PartialEq)]
pub enum AMF0Value {
    Number {
        value: f64,
    },
    Bool {
        value: bool,
    },
    String {
        value: String,
    },
    Object {
        properties: HashMap<String, AMF0Value>,
    },
    Null,
    Undefined,
    Ref {
        addr: i64,
    },
    Array {
        items: HashMap<String, AMF0Value>,
    },
    StrictArray {
        items: Vec<AMF0Value>,
    },
    Date {
        timestamp: f64,
    },
    LongString {
        value: String,
    },
    XmlDocument {
        content: String,
    },
    TypedObject {
        type_name: String,
        properties: HashMap<String, AMF0Value>,
    },
}

impl AMF0Value {
    /// Creates a string value
    pub fn string(value: &str) -> AMF0Value {
        AMF0Value::String {
            value: value.to_string(),
        }
    }

    /// Creates a number value
    pub fn number(value: f64) -> AMF0Value {
        AMF0Value::Number { value }
    }

    /// Creates an object value from a list of properties
    pub fn object(properties: Vec<(&str, AMF0Value)>) -> AMF0Value {
        AMF0Value::Object {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Obtains a string representation of the value
    /// Used for debug logging purposes
    pub fn to_debug_string(&self, tabs: &str) -> String {
        match self {
            AMF0Value::Number { value } => format!("{}", value),
            AMF0Value::Bool { value } => {
                if *value {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            AMF0Value::String { value } => format!("'{}'", value),
            AMF0Value::Object { properties } => {
                format!("{{\n{}{}}}", Self::debug_properties(properties, tabs), tabs)
            }
            AMF0Value::Null => "NULL".to_string(),
            AMF0Value::Undefined => "UNDEFINED".to_string(),
            AMF0Value::Ref { addr } => format!("REF#{}", addr),
            AMF0Value::Array { items } => {
                format!("ARRAY [\n{}{}]", Self::debug_properties(items, tabs), tabs)
            }
            AMF0Value::StrictArray { items } => {
                let mut res = "STRICT_ARRAY [\n".to_string();

                for value in items.iter() {
                    res.push_str(tabs);
                    res.push_str("    ");
                    res.push_str(&value.to_debug_string(&format!("{}    ", tabs)));
                    res.push('\n');
                }

                res.push_str(tabs);
                res.push(']');

                res
            }
            AMF0Value::Date { timestamp } => format!("DATE({})", timestamp),
            AMF0Value::LongString { value } => format!("L'{}'", value),
            AMF0Value::XmlDocument { content } => format!("XML'{}'", content),
            AMF0Value::TypedObject {
                type_name,
                properties,
            } => format!(
                "{} {{\n{}{}}}",
                type_name,
                Self::debug_properties(properties, tabs),
                tabs
            ),
        }
    }

    fn debug_properties(properties: &HashMap<String, AMF0Value>, tabs: &str) -> String {
        let mut keys: Vec<&String> = properties.keys().collect();
        keys.sort();

        let mut res = String::new();

        for key in keys {
            res.push_str(tabs);
            res.push_str("    '");
            res.push_str(key);
            res.push_str("' = ");
            res.push_str(&properties[key].to_debug_string(&format!("{}    ", tabs)));
            res.push('\n');
        }

        res
    }

    // Value check functions:

    /// Returns true if the value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, AMF0Value::Undefined)
    }

    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, AMF0Value::Null)
    }

    /// Returns true if the value is a number
    pub fn is_number(&self) -> bool {
        matches!(self, AMF0Value::Number { .. })
    }

    /// Returns the value as boolean
    pub fn get_bool(&self) -> bool {
        match self {
            AMF0Value::Bool { value } => *value,
            AMF0Value::Number { value } => *value != 0.0,
            _ => false,
        }
    }

    /// Returns the value as integer
    pub fn get_integer(&self) -> i64 {
        match self {
            AMF0Value::Number { value } => *value as i64,
            AMF0Value::Ref { addr } => *addr,
            AMF0Value::Date { timestamp } => *timestamp as i64,
            _ => 0,
        }
    }

    /// Returns the value as float
    pub fn get_float(&self) -> f64 {
        match self {
            AMF0Value::Number { value } => *value,
            AMF0Value::Ref { addr } => *addr as f64,
            AMF0Value::Date { timestamp } => *timestamp,
            _ => 0.0,
        }
    }

    /// Returns the value as string
    pub fn get_string(&self) -> &str {
        match self {
            AMF0Value::String { value } => value.as_str(),
            AMF0Value::LongString { value } => value.as_str(),
            AMF0Value::XmlDocument { content } => content.as_str(),
            _ => "",
        }
    }

    /// Returns the value as object (HashMap)
    pub fn get_object(&self) -> Option<&HashMap<String, AMF0Value>> {
        match self {
            AMF0Value::Object { properties } => Some(properties),
            AMF0Value::Array { items } => Some(items),
            AMF0Value::TypedObject {
                type_name: _,
                properties,
            } => Some(properties),
            _ => None,
        }
    }

    /// Gets the value of a property (for objects)
    pub fn get_object_property(&self, property_name: &str) -> Option<&AMF0Value> {
        self.get_object().and_then(|o| o.get(property_name))
    }

    /// Gets a string property of an object, if present
    pub fn get_object_string(&self, property_name: &str) -> Option<&str> {
        self.get_object_property(property_name)
            .map(|v| v.get_string())
    }

    // Encoding functions:

    /// Encodes value into bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AMF0Value::Number { value } => {
                let mut buf = vec![AMF0_TYPE_NUMBER];
                buf.extend(Self::encode_number(*value));
                buf
            }
            AMF0Value::Bool { value } => vec![AMF0_TYPE_BOOL, if *value { 0x01 } else { 0x00 }],
            AMF0Value::String { value } => {
                if value.len() > u16::MAX as usize {
                    let mut buf = vec![AMF0_TYPE_LONG_STRING];
                    buf.extend(Self::encode_long_string(value));
                    buf
                } else {
                    let mut buf = vec![AMF0_TYPE_STRING];
                    buf.extend(Self::encode_string(value));
                    buf
                }
            }
            AMF0Value::Object { properties } => {
                let mut buf = vec![AMF0_TYPE_OBJECT];
                buf.extend(Self::encode_object(properties));
                buf
            }
            AMF0Value::Null => vec![AMF0_TYPE_NULL],
            AMF0Value::Undefined => vec![AMF0_TYPE_UNDEFINED],
            AMF0Value::Ref { addr } => {
                let mut buf = vec![AMF0_TYPE_REF, 0x00, 0x00];
                BigEndian::write_u16(&mut buf[1..3], *addr as u16);
                buf
            }
            AMF0Value::Array { items } => {
                let mut buf = vec![AMF0_TYPE_ARRAY, 0x00, 0x00, 0x00, 0x00];
                BigEndian::write_u32(&mut buf[1..5], items.len() as u32);
                buf.extend(Self::encode_object(items));
                buf
            }
            AMF0Value::StrictArray { items } => {
                let mut buf = vec![AMF0_TYPE_STRICT_ARRAY, 0x00, 0x00, 0x00, 0x00];
                BigEndian::write_u32(&mut buf[1..5], items.len() as u32);

                for item in items {
                    buf.extend(item.encode());
                }

                buf
            }
            AMF0Value::Date { timestamp } => {
                let mut buf = vec![AMF0_TYPE_DATE];
                buf.extend(Self::encode_number(*timestamp));
                buf.extend([0x00, 0x00]);
                buf
            }
            AMF0Value::LongString { value } => {
                let mut buf = vec![AMF0_TYPE_LONG_STRING];
                buf.extend(Self::encode_long_string(value));
                buf
            }
            AMF0Value::XmlDocument { content } => {
                let mut buf = vec![AMF0_TYPE_XML_DOC];
                buf.extend(Self::encode_long_string(content));
                buf
            }
            AMF0Value::TypedObject {
                type_name,
                properties,
            } => {
                let mut buf = vec![AMF0_TYPE_TYPED_OBJ];
                buf.extend(Self::encode_string(type_name));
                buf.extend(Self::encode_object(properties));
                buf
            }
        }
    }

    /// Encodes number value
    fn encode_number(num: f64) -> Vec<u8> {
        let mut buf = vec![0; 8];
        BigEndian::write_f64(&mut buf, num);
        buf
    }

    /// Encodes string value (16 bit length prefix)
    fn encode_string(s: &str) -> Vec<u8> {
        let mut buf = vec![0x00; 2];
        BigEndian::write_u16(&mut buf, s.len() as u16);
        buf.extend(s.bytes());
        buf
    }

    /// Encodes string value (32 bit length prefix)
    fn encode_long_string(s: &str) -> Vec<u8> {
        let mut buf = vec![0x00; 4];
        BigEndian::write_u32(&mut buf, s.len() as u32);
        buf.extend(s.bytes());
        buf
    }

    /// Encodes object properties, sorted by key, plus the end marker
    fn encode_object(o: &HashMap<String, AMF0Value>) -> Vec<u8> {
        let mut buf = Vec::new();

        let mut entries: Vec<(&String, &AMF0Value)> = o.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (key, value) in entries {
            buf.extend(Self::encode_string(key));
            buf.extend(value.encode());
        }

        buf.extend(Self::encode_string(""));
        buf.push(AMF0_OBJECT_TERM_CODE);

        buf
    }

    // Decoding functions:

    /// Reads an instance of AMF0Value from a cursor
    pub fn read(cursor: &mut AMFDecodingCursor) -> Result<AMF0Value, ()> {
        Self::read_value(cursor, 0)
    }

    fn read_value(cursor: &mut AMFDecodingCursor, depth: usize) -> Result<AMF0Value, ()> {
        if depth > AMF0_MAX_DEPTH {
            return Err(());
        }

        let amf0_type = cursor.read_byte()?;

        match amf0_type {
            AMF0_TYPE_NUMBER => Ok(AMF0Value::Number {
                value: cursor.read_f64()?,
            }),
            AMF0_TYPE_BOOL => Ok(AMF0Value::Bool {
                value: cursor.read_byte()? != 0,
            }),
            AMF0_TYPE_STRING => Ok(AMF0Value::String {
                value: Self::read_string(cursor)?,
            }),
            AMF0_TYPE_OBJECT => Ok(AMF0Value::Object {
                properties: Self::read_object(cursor, depth)?,
            }),
            AMF0_TYPE_NULL => Ok(AMF0Value::Null),
            AMF0_TYPE_UNDEFINED => Ok(AMF0Value::Undefined),
            AMF0_TYPE_REF => Ok(AMF0Value::Ref {
                addr: cursor.read_u16()? as i64,
            }),
            AMF0_TYPE_ARRAY => {
                // The count is only a hint, the list is terminated like an object
                cursor.read_u32()?;

                Ok(AMF0Value::Array {
                    items: Self::read_object(cursor, depth)?,
                })
            }
            AMF0_TYPE_STRICT_ARRAY => {
                let count = cursor.read_u32()?;
                let mut items = Vec::new();

                for _ in 0..count {
                    items.push(Self::read_value(cursor, depth + 1)?);
                }

                Ok(AMF0Value::StrictArray { items })
            }
            AMF0_TYPE_DATE => {
                let timestamp = cursor.read_f64()?;
                cursor.read_u16()?; // Time zone, unused

                Ok(AMF0Value::Date { timestamp })
            }
            AMF0_TYPE_LONG_STRING => Ok(AMF0Value::LongString {
                value: Self::read_long_string(cursor)?,
            }),
            AMF0_TYPE_XML_DOC => Ok(AMF0Value::XmlDocument {
                content: Self::read_long_string(cursor)?,
            }),
            AMF0_TYPE_TYPED_OBJ => {
                let type_name = Self::read_string(cursor)?;

                Ok(AMF0Value::TypedObject {
                    type_name,
                    properties: Self::read_object(cursor, depth)?,
                })
            }
            _ => Err(()),
        }
    }

    fn read_string(cursor: &mut AMFDecodingCursor) -> Result<String, ()> {
        let len = cursor.read_u16()? as usize;
        let bytes = cursor.read(len)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| ())
    }

    fn read_long_string(cursor: &mut AMFDecodingCursor) -> Result<String, ()> {
        let len = cursor.read_u32()? as usize;
        let bytes = cursor.read(len)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| ())
    }

    fn read_object(
        cursor: &mut AMFDecodingCursor,
        depth: usize,
    ) -> Result<HashMap<String, AMF0Value>, ()> {
        let mut properties = HashMap::new();

        loop {
            let key = Self::read_string(cursor)?;

            if key.is_empty() && cursor.look_byte()? == AMF0_TYPE_OBJECT_END {
                cursor.read_byte()?;
                return Ok(properties);
            }

            let value = Self::read_value(cursor, depth + 1)?;

            properties.insert(key, value);
        }
    }
}

// Tests
