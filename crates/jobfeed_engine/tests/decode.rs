use std::sync::Once;

use jobfeed_engine::{decode_page, DecodeError};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

#[test]
fn utf8_bom_wins_over_a_conflicting_charset_header() {
    init_logging();
    let mut bytes = vec![0xef, 0xbb, 0xbf];
    bytes.extend_from_slice("Zürich".as_bytes());

    // The header lies; the BOM decides.
    let page = decode_page(&bytes, Some("text/html; charset=iso-8859-1")).expect("decodes");

    assert_eq!(page.html, "Zürich");
    assert_eq!(page.encoding_label, "UTF-8");
}

#[test]
fn utf16le_bom_is_honored() {
    init_logging();
    let mut bytes = vec![0xff, 0xfe];
    for unit in "Job".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let page = decode_page(&bytes, None).expect("decodes");

    assert_eq!(page.html, "Job");
    assert_eq!(page.encoding_label, "UTF-16LE");
}

#[test]
fn charset_header_is_used_when_there_is_no_bom() {
    init_logging();
    // "café" in latin-1: the final byte is 0xe9, invalid as UTF-8.
    let bytes = b"caf\xe9";

    let page = decode_page(bytes, Some("text/html; charset=iso-8859-1")).expect("decodes");

    assert_eq!(page.html, "café");
    // encoding_rs folds the iso-8859-1 label into windows-1252.
    assert_eq!(page.encoding_label, "windows-1252");
}

#[test]
fn quoted_charset_parameter_is_accepted() {
    init_logging();
    let bytes = b"caf\xe9";

    let page = decode_page(bytes, Some("text/html; charset=\"windows-1252\"")).expect("decodes");

    assert_eq!(page.html, "café");
    assert_eq!(page.encoding_label, "windows-1252");
}

#[test]
fn detection_kicks_in_without_bom_or_charset_header() {
    init_logging();
    let bytes = "Zürich listings".as_bytes();

    let page = decode_page(bytes, Some("text/html")).expect("decodes");

    assert_eq!(page.html, "Zürich listings");
    assert_eq!(page.encoding_label, "UTF-8");
}

#[test]
fn unknown_charset_label_falls_back_to_detection() {
    init_logging();
    let bytes = "Zürich listings".as_bytes();

    let page = decode_page(bytes, Some("text/html; charset=no-such-charset")).expect("decodes");

    assert_eq!(page.html, "Zürich listings");
    assert_eq!(page.encoding_label, "UTF-8");
}

#[test]
fn bytes_invalid_in_the_declared_charset_are_a_decode_error() {
    init_logging();
    let err = decode_page(b"<html>abc\xff</html>", Some("text/html; charset=utf-8"))
        .expect_err("0xff can never appear in utf-8");

    assert_eq!(
        err,
        DecodeError::DecodeFailure {
            encoding: "UTF-8".to_string()
        }
    );
}
