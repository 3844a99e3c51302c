use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// A fetched page decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode page as {encoding}")]
    DecodeFailure { encoding: String },
}

/// Decode raw page bytes into UTF-8: BOM first, then the Content-Type
/// charset, then chardetng detection over the whole body.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedPage, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_as(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(charset_param) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return decode_as(bytes, encoding);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_as(bytes, detector.guess(None, true))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        } else {
            None
        }
    })
}

fn decode_as(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedPage, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}
