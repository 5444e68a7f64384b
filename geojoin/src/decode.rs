//! Décodage du texte des uploads (BOM, UTF-8, encodage déclaré)

use encoding_rs::{Encoding, WINDOWS_1252};
use memchr::memmem;
use tracing::warn;

/// Nombre d'octets inspectés pour trouver la déclaration XML
const PROLOG_WINDOW: usize = 1024;

/// Décode les octets d'un upload en texte.
///
/// Ordre de détection :
/// 1. BOM (UTF-8, UTF-16 LE/BE)
/// 2. UTF-8 valide (validation SIMD)
/// 3. encodage déclaré dans le prologue XML (`encoding="..."`)
/// 4. Windows-1252 par défaut
///
/// N'échoue jamais : les séquences invalides deviennent U+FFFD.
pub fn decode_text(data: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        let (decoded, _) = encoding.decode_without_bom_handling(&data[bom_len..]);
        return decoded.into_owned();
    }

    if let Ok(text) = simdutf8::basic::from_utf8(data) {
        return text.to_string();
    }

    let encoding = declared_encoding(data).unwrap_or_else(|| {
        warn!("Input is not valid UTF-8 and declares no encoding, falling back to windows-1252");
        WINDOWS_1252
    });

    let (decoded, had_errors) = encoding.decode_without_bom_handling(data);
    if had_errors {
        warn!(encoding = encoding.name(), "Invalid byte sequences replaced while decoding");
    }
    decoded.into_owned()
}

/// Lit le label `encoding` de la déclaration XML, s'il est reconnu
fn declared_encoding(data: &[u8]) -> Option<&'static Encoding> {
    let prolog = &data[..data.len().min(PROLOG_WINDOW)];

    let decl_start = memmem::find(prolog, b"<?xml")?;
    let decl_end = memmem::find(&prolog[decl_start..], b"?>").map(|p| decl_start + p)?;
    let decl = &prolog[decl_start..decl_end];

    let attr = memmem::find(decl, b"encoding")?;
    let rest = &decl[attr + b"encoding".len()..];

    // encoding = "label" ou encoding='label'
    let quote_pos = rest.iter().position(|&b| b == b'"' || b == b'\'')?;
    let quote = rest[quote_pos];
    let value = &rest[quote_pos + 1..];
    let value_end = value.iter().position(|&b| b == quote)?;

    let label = &value[..value_end];
    let encoding = Encoding::for_label(label);
    if encoding.is_none() {
        warn!(
            label = %String::from_utf8_lossy(label),
            "Unknown encoding label in XML declaration"
        );
    }
    encoding
}
