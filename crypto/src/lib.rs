//! Cryptographic primitives for the idproof pipeline.
//!
//! - **AES-256-GCM** envelopes protect the applicant payload between the
//!   enqueuing caller and the proofing job (see [`envelope`]).
//! - **Ed25519** signs the certificate-mode handshake with the state-record
//!   vendor (see [`handshake`]).

pub mod decryptor;
pub mod envelope;
pub mod error;
pub mod handshake;
pub mod key;

pub use decryptor::PayloadDecryptor;
pub use envelope::{open_envelope, seal_envelope, ENVELOPE_VERSION};
pub use error::{DecryptionError, HandshakeError, KeyError};
pub use handshake::{public_key_hex, sign_handshake, verify_handshake, HandshakeProof};
pub use key::{Keyring, PayloadKey};
