use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use grab_logging::grab_debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub text: String,
    pub encoding_label: &'static str,
    /// Some bytes could not be decoded and were replaced.
    pub lossy: bool,
}

/// Decode page bytes to text: BOM, then Content-Type charset, then chardetng.
///
/// Never fails; malformed sequences become U+FFFD so extraction can still
/// run over the rest of the page.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(encoding) = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']))
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedPage {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        grab_debug!("Page decoded with replacement characters as {}", used.name());
    }
    DecodedPage {
        text: text.into_owned(),
        encoding_label: used.name(),
        lossy: had_errors,
    }
}
