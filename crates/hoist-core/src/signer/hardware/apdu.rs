//! APDU framing for the signing device application.

use crate::error::{Error, Result};

pub const CLA: u8 = 0x00;
pub const INS_GET_PUBLIC_KEY: u8 = 0x02;
pub const INS_SIGN: u8 = 0x03;

const P1_FIRST: u8 = 0x00;
const P1_NEXT: u8 = 0x01;
const P2_MORE: u8 = 0x80;
const P2_LAST: u8 = 0x00;

pub const MAX_CHUNK: usize = 255;

pub const SW_OK: u16 = 0x9000;
pub const SW_DENIED: u16 = 0x6985;
const SW_APP_NOT_OPEN: [u16; 3] = [0x6d00, 0x6e00, 0x6e01];
const SW_LOCKED: u16 = 0x5515;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.data.len());
        out.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.data.len() as u8]);
        out.extend_from_slice(&self.data);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    pub data: Vec<u8>,
    pub status_word: u16,
}

impl ApduResponse {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(Error::DeviceUnavailable(format!(
                "truncated device response ({} bytes)",
                raw.len()
            )));
        }
        let (data, sw) = raw.split_at(raw.len() - 2);
        Ok(Self {
            data: data.to_vec(),
            status_word: u16::from_be_bytes([sw[0], sw[1]]),
        })
    }

    /// Map the status word onto the error taxonomy.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.status_word {
            SW_OK => Ok(self.data),
            SW_DENIED => Err(Error::UserRejected),
            SW_LOCKED => Err(Error::DeviceUnavailable("device is locked".to_string())),
            sw if SW_APP_NOT_OPEN.contains(&sw) => Err(Error::DeviceUnavailable(
                "signing app is not open on the device".to_string(),
            )),
            status_word => Err(Error::DeviceResponse { status_word }),
        }
    }
}

/// Split `payload` into framed commands for `ins`.
pub fn chunked(ins: u8, payload: &[u8]) -> Vec<ApduCommand> {
    if payload.is_empty() {
        return vec![ApduCommand {
            cla: CLA,
            ins,
            p1: P1_FIRST,
            p2: P2_LAST,
            data: Vec::new(),
        }];
    }

    let chunks: Vec<&[u8]> = payload.chunks(MAX_CHUNK).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| ApduCommand {
            cla: CLA,
            ins,
            p1: if i == 0 { P1_FIRST } else { P1_NEXT },
            p2: if i == last { P2_LAST } else { P2_MORE },
            data: chunk.to_vec(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_long_payloads_with_continuation_flags() {
        let payload = vec![0xab; MAX_CHUNK * 2 + 10];
        let commands = chunked(INS_SIGN, &payload);
        assert_eq!(commands.len(), 3);
        assert_eq!((commands[0].p1, commands[0].p2), (P1_FIRST, P2_MORE));
        assert_eq!((commands[1].p1, commands[1].p2), (P1_NEXT, P2_MORE));
        assert_eq!((commands[2].p1, commands[2].p2), (P1_NEXT, P2_LAST));
        assert_eq!(commands[2].data.len(), 10);
    }

    #[test]
    fn command_encoding_has_header_and_length() {
        let command = &chunked(INS_GET_PUBLIC_KEY, &[1, 2, 3])[0];
        assert_eq!(command.to_bytes(), vec![CLA, INS_GET_PUBLIC_KEY, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn status_words_map_to_errors() {
        let ok = ApduResponse::parse(&[7, 0x90, 0x00]).unwrap();
        assert_eq!(ok.into_result().unwrap(), vec![7]);

        let denied = ApduResponse::parse(&[0x69, 0x85]).unwrap();
        assert!(matches!(denied.into_result(), Err(Error::UserRejected)));

        let closed = ApduResponse::parse(&[0x6e, 0x00]).unwrap();
        assert!(matches!(closed.into_result(), Err(Error::DeviceUnavailable(_))));

        let odd = ApduResponse::parse(&[0x6a, 0x80]).unwrap();
        assert!(matches!(
            odd.into_result(),
            Err(Error::DeviceResponse { status_word: 0x6a80 })
        ));

        assert!(ApduResponse::parse(&[0x90]).is_err());
    }
}
