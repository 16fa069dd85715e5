//! Wire format of click messages.
//!
//! Messages are plain ASCII: `<device_id>_clicks_<count>`, for example
//! `DEVICE2_clicks_3`. Receivers only look at the last underscore-separated
//! token, so any prefix is accepted as long as it ends in a number.

use crate::Error;
use std::fmt;
use std::ops::RangeInclusive;

/// Counts that name a pattern.
pub const PATTERN_IDS: RangeInclusive<i64> = 1..=3;

/// An outbound "this many clicks happened here" event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClickMessage<'a> {
    pub device_id: &'a str,
    pub count: u32,
}

impl fmt::Display for ClickMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_clicks_{}", self.device_id, self.count)
    }
}

/// Whether `text` was sent by the device with this id.
///
/// This is a plain prefix test, so an id that is a prefix of another
/// (`DEVICE2` and `DEVICE20`) also matches the longer one.
pub fn is_from(device_id: &str, text: &str) -> bool {
    text.starts_with(device_id)
}

/// Extract the requested pattern id from an inbound message.
pub fn parse_pattern_id(text: &str) -> Result<u32, Error> {
    let malformed = || Error::MalformedMessage(text.to_string());

    let token = text.rsplit('_').next().ok_or_else(malformed)?;
    let value: i64 = token.trim().parse().map_err(|_| malformed())?;

    if PATTERN_IDS.contains(&value) {
        u32::try_from(value).map_err(|_| malformed())
    } else {
        Err(malformed())
    }
}

/// Turn a raw MQTT payload into text.
pub fn decode_payload(payload: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(payload)
        .map(str::to_string)
        .map_err(|_| Error::MalformedMessage(String::from_utf8_lossy(payload).into_owned()))
}
