// RTMP handshake utils (client side)

use byteorder::{BigEndian, ByteOrder};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use sha2::Sha256;

use crate::{log::Logger, log_debug};

use super::{GENUINE_FP, RTMP_CLIENT_VERSION, RTMP_HANDSHAKE_SIZE, RTMP_VERSION, SHA256DL};

/// Generates the opening of the handshake (C0 + C1)
///
/// C1 carries a digest keyed with the Flash Player genuine key, so
/// servers requiring the digest handshake accept it, while servers
/// using the basic handshake just echo it.
pub fn generate_c0_c1(logger: &Logger) -> Result<Vec<u8>, ()> {
    let c1 = generate_c1(logger)?;

    let mut all_bytes: Vec<u8> = Vec::with_capacity(1 + RTMP_HANDSHAKE_SIZE);

    all_bytes.push(RTMP_VERSION);
    all_bytes.extend(c1);

    Ok(all_bytes)
}

/// Generates C1
pub fn generate_c1(logger: &Logger) -> Result<Vec<u8>, ()> {
    let mut c1: Vec<u8> = vec![0; RTMP_HANDSHAKE_SIZE];

    BigEndian::write_u32(&mut c1[0..4], Utc::now().timestamp_millis() as u32);
    c1[4..8].copy_from_slice(&RTMP_CLIENT_VERSION);

    let mut rng = StdRng::from_os_rng();

    rng.fill_bytes(&mut c1[8..]);

    let digest_offset = get_client_genuine_const_digest_offset(&c1[8..12]);

    let h = calc_hmac(&message_without_digest(&c1, digest_offset), GENUINE_FP.as_bytes())?;

    if h.len() != SHA256DL {
        log_debug!(
            logger,
            format!(
                "HMAC size invalid. Expected {}, but found {}",
                SHA256DL,
                h.len()
            )
        );

        return Err(());
    }

    c1[digest_offset..digest_offset + SHA256DL].copy_from_slice(&h);

    Ok(c1)
}

/// Checks the version sent by the server in S0
pub fn validate_s0(version: u8) -> Result<(), ()> {
    if version == RTMP_VERSION {
        Ok(())
    } else {
        Err(())
    }
}

/// Generates C2: the server S1, echoed back
pub fn generate_c2(s1: &[u8]) -> Result<Vec<u8>, ()> {
    if s1.len() != RTMP_HANDSHAKE_SIZE {
        return Err(());
    }

    Ok(s1.to_vec())
}

/// Gets the handshake bytes, except the digest
fn message_without_digest(handshake_bytes: &[u8], digest_offset: usize) -> Vec<u8> {
    let mut msg: Vec<u8> = Vec::with_capacity(RTMP_HANDSHAKE_SIZE - SHA256DL);

    msg.extend(&handshake_bytes[0..digest_offset]);
    msg.extend(&handshake_bytes[digest_offset + SHA256DL..]);

    msg
}

/// Calculates HMAC
fn calc_hmac(message: &[u8], key: &[u8]) -> Result<Vec<u8>, ()> {
    let mut mac: Hmac<Sha256> = Hmac::new_from_slice(key).map_err(|_| ())?;

    mac.update(message);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Gets the digest offset of the RTMP Genuine const of the client
fn get_client_genuine_const_digest_offset(buf: &[u8]) -> usize {
    if buf.len() < 4 {
        return 0;
    }

    (((buf[0] as usize) + (buf[1] as usize) + (buf[2] as usize) + (buf[3] as usize)) % 728) + 12
}

// Tests
