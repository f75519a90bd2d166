use super::*;

fn toks(text: &str) -> Vec<String> {
    tokenize(text)
}

fn brands() -> Vec<String> {
    ["Kingspan", "Celotex", "Knauf", "Knauf Insulation", "British Gypsum"]
        .iter()
        .map(|b| (*b).to_string())
        .collect()
}

// -----------------------------------------------------------------------
// tokenize
// -----------------------------------------------------------------------

#[test]
fn tokenize_lowercases_and_splits_punctuation() {
    assert_eq!(
        toks("Celotex GA4000, PIR Board!"),
        vec!["celotex", "ga4000", "pir", "board"]
    );
}

#[test]
fn tokenize_joins_spaced_units() {
    assert_eq!(toks("50 mm PIR"), vec!["50mm", "pir"]);
    assert_eq!(toks("12.5 mm plasterboard"), vec!["12.5mm", "plasterboard"]);
}

#[test]
fn tokenize_splits_dimension_groups_and_carries_unit() {
    assert_eq!(
        toks("Kingspan TP10 2400 x 1200 x 50mm"),
        vec!["kingspan", "tp10", "2400mm", "1200mm", "50mm"]
    );
}

#[test]
fn tokenize_handles_compact_dimensions() {
    assert_eq!(toks("1.2mx2.4m"), vec!["1200mm", "2400mm"]);
}

#[test]
fn tokenize_canonicalizes_units() {
    assert_eq!(toks("5cm"), vec!["50mm"]);
    assert_eq!(toks("50.0mm"), vec!["50mm"]);
    assert_eq!(toks("2.88 m²"), vec!["2.88m2"]);
    assert_eq!(toks("10 sqm"), vec!["10m2"]);
}

#[test]
fn tokenize_leaves_model_numbers_alone() {
    assert_eq!(toks("TP10 x2"), vec!["tp10", "x2"]);
}

#[test]
fn tokenize_keeps_oversized_length_verbatim() {
    assert_eq!(
        toks("1000000000000000000000000000m pir"),
        vec!["1000000000000000000000000000m", "pir"]
    );
    assert_eq!(
        toks("9000000000000000000000000000cm"),
        vec!["9000000000000000000000000000cm"]
    );
}

#[test]
fn tokenize_empty_input() {
    assert!(toks("  ").is_empty());
}

// -----------------------------------------------------------------------
// sizes
// -----------------------------------------------------------------------

#[test]
fn size_tokens_sorted_and_deduplicated() {
    let tokens = toks("50mm board 1200 x 2400 x 50mm");
    assert_eq!(size_tokens(&tokens), vec!["1200mm", "2400mm", "50mm"]);
}

#[test]
fn thickness_is_smallest_mm_dimension() {
    let tokens = toks("2400 x 1200 x 100mm");
    assert_eq!(thickness_mm(&tokens), Some(Decimal::new(100, 0)));
    assert_eq!(thickness_mm(&toks("12.5mm plasterboard")), Some(Decimal::new(125, 1)));
    assert_eq!(thickness_mm(&toks("insulation board")), None);
}

#[test]
fn collapse_whitespace_trims_and_joins() {
    assert_eq!(collapse_whitespace("  Celotex \n\t GA4000  "), "Celotex GA4000");
}

// -----------------------------------------------------------------------
// category
// -----------------------------------------------------------------------

#[test]
fn infer_category_pir_by_brand_or_keyword() {
    assert_eq!(infer_category(&toks("Celotex GA4000 50mm")), Category::PirInsulation);
    assert_eq!(infer_category(&toks("50mm PIR Board")), Category::PirInsulation);
}

#[test]
fn infer_category_mineral_wool() {
    assert_eq!(infer_category(&toks("Rockwool RWA45 100mm")), Category::MineralWool);
    assert_eq!(infer_category(&toks("Loft roll glass wool")), Category::MineralWool);
}

#[test]
fn infer_category_plasterboard() {
    assert_eq!(
        infer_category(&toks("Gyproc WallBoard 12.5mm")),
        Category::Plasterboard
    );
    assert_eq!(
        infer_category(&toks("Standard plaster board 2400 x 1200")),
        Category::Plasterboard
    );
}

#[test]
fn infer_category_falls_back_to_other() {
    assert_eq!(infer_category(&toks("Timber batten 47 x 50")), Category::Other);
}

#[test]
fn category_tokens_for_labels() {
    assert_eq!(category_tokens(Category::PirInsulation), vec!["pir", "insulation"]);
    assert!(category_tokens(Category::Other).is_empty());
}

// -----------------------------------------------------------------------
// brand
// -----------------------------------------------------------------------

#[test]
fn detect_brand_single_word() {
    assert_eq!(
        detect_brand(&toks("Celotex GA4000 50mm"), &brands()),
        Some("Celotex".to_string())
    );
}

#[test]
fn detect_brand_prefers_longest_match() {
    assert_eq!(
        detect_brand(&toks("Knauf Insulation Earthwool Loft Roll"), &brands()),
        Some("Knauf Insulation".to_string())
    );
    assert_eq!(
        detect_brand(&toks("Knauf Acoustic Roll"), &brands()),
        Some("Knauf".to_string())
    );
}

#[test]
fn detect_brand_requires_contiguous_tokens() {
    assert_eq!(detect_brand(&toks("British made Gypsum board"), &brands()), None);
    assert_eq!(
        detect_brand(&toks("British Gypsum Gyproc"), &brands()),
        Some("British Gypsum".to_string())
    );
}

#[test]
fn detect_brand_none_when_unknown() {
    assert_eq!(detect_brand(&toks("Generic PIR board"), &brands()), None);
}
