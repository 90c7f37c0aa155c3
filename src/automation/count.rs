//! Reading the inventory's "current/total" item counter.

use regex::Regex;

use super::navigator::Navigator;
use crate::config::CardLayout;
use crate::error::ScanError;
use crate::observer::ScanObserver;
use crate::ocr::{read_unpooled, EngineFactory, OcrRequest, Recipe};

/// Everything except digits and the separator.
const COUNT_NOISE_PATTERN: &str = r"[^\d/]";

/// Counts above this are assumed to be misreads.
const MAX_PLAUSIBLE_COUNT: u64 = 2000;

/// Interprets a counter read without its slash as "current" and "total"
/// run together.
///
/// This is a guess tuned to one font and one inventory size: dividing by
/// 2000 drops a four-digit total. It can under- or over-count and is only
/// used when the slash is missing.
pub fn fused_count_fallback(fused: u64) -> u64 {
    fused / 2000
}

fn cap_count(mut count: u64) -> u64 {
    while count > MAX_PLAUSIBLE_COUNT {
        count /= 20;
    }
    count
}

/// Parses raw counter text such as "1234/2000".
pub fn parse_item_count(text: &str) -> Result<u64, ScanError> {
    let noise = Regex::new(COUNT_NOISE_PATTERN)?;
    let cleaned = noise.replace_all(text, "");
    let malformed = || ScanError::MalformedCount(text.trim().to_string());

    let count = match cleaned.split_once('/') {
        Some((current, _)) => current.parse::<u64>().map_err(|_| malformed())?,
        None => {
            let fused = cleaned.parse::<u64>().map_err(|_| malformed())?;
            let guess = fused_count_fallback(fused);
            tracing::warn!(
                "Item counter '{}' has no separator, guessing {} items",
                text.trim(),
                guess
            );
            guess
        }
    };
    Ok(cap_count(count))
}

/// Reads the item counter from the screen with a one-off engine.
pub fn detect_item_count(
    navigator: &mut dyn Navigator,
    layout: &CardLayout,
    factory: &dyn EngineFactory,
    observer: &dyn ScanObserver,
) -> Result<u64, ScanError> {
    let window = navigator.geometry();
    let region = layout.item_count.to_pixels(window.width, window.height);
    let image = navigator.capture_region(region)?;

    let (prepared, text) = read_unpooled(factory, &image, &Recipe::ITEM_COUNT, &OcrRequest::FRACTION)?;
    observer.preview("item_count", &prepared, &text);

    let count = parse_item_count(&text)?;
    tracing::info!("Detected {} items", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::navigator::ReplayNavigator;
    use crate::observer::NullObserver;
    use crate::test_util::ScriptedFactory;
    use image::RgbaImage;

    #[test]
    fn test_slash_takes_left_side() {
        assert_eq!(parse_item_count("1234/2000").unwrap(), 1234);
        assert_eq!(parse_item_count(" Weapons 87 / 2000\n").unwrap(), 87);
    }

    #[test]
    fn test_fused_counter_heuristic() {
        // "123" and "2000" read as one number
        assert_eq!(parse_item_count("1232000").unwrap(), 616);
        assert_eq!(fused_count_fallback(1232000), 616);
        // Still implausible after the division, so it keeps shrinking
        assert_eq!(fused_count_fallback(12342000), 6171);
        assert_eq!(parse_item_count("12342000").unwrap(), 308);
    }

    #[test]
    fn test_implausible_counts_shrink() {
        assert_eq!(cap_count(6171), 308);
        assert_eq!(cap_count(2000), 2000);
        assert_eq!(parse_item_count("45000/2000").unwrap(), 2250 / 20);
    }

    #[test]
    fn test_unreadable_counter() {
        assert!(matches!(parse_item_count(""), Err(ScanError::MalformedCount(_))));
        assert!(matches!(parse_item_count("abc"), Err(ScanError::MalformedCount(_))));
        assert!(matches!(parse_item_count("/2000"), Err(ScanError::MalformedCount(_))));
    }

    #[test]
    fn test_detect_reads_counter_region() {
        let factory = ScriptedFactory::new(|img, request| {
            assert_eq!(request.whitelist, Some("0123456789/"));
            assert_eq!(img.dimensions(), (145, 24));
            Ok("212/2000".to_string())
        });
        let mut nav = ReplayNavigator::new(vec![RgbaImage::new(1280, 720)]).unwrap();
        let count = detect_item_count(&mut nav, &CardLayout::default(), &factory, &NullObserver).unwrap();
        assert_eq!(count, 212);
        assert_eq!(factory.created(), 1);
    }
}
