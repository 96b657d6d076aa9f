use super::*;

fn codepoints(s: &str) -> Vec<u32> {
    s.chars().map(|c| c as u32).collect()
}

#[test]
fn contextual_forms_for_marhaba() {
    // meem reh hah beh alef
    let shaped = reshape_arabic("\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}");
    assert_eq!(
        codepoints(&shaped),
        vec![0xFEE3, 0xFEAE, 0xFEA3, 0xFE92, 0xFE8E]
    );
}

#[test]
fn lam_alef_becomes_a_ligature() {
    // seen lam alef meem
    let shaped = reshape_arabic("\u{0633}\u{0644}\u{0627}\u{0645}");
    assert_eq!(codepoints(&shaped), vec![0xFEB3, 0xFEFC, 0xFEE1]);

    // word-initial lam-alef uses the isolated ligature
    let shaped = reshape_arabic("\u{0644}\u{0627}");
    assert_eq!(codepoints(&shaped), vec![0xFEFB]);
}

#[test]
fn single_letters_are_isolated_and_harakat_dropped() {
    assert_eq!(codepoints(&reshape_arabic("\u{0628}")), vec![0xFE8F]);
    assert_eq!(
        codepoints(&reshape_arabic("\u{0628}\u{064E}\u{0628}")),
        vec![0xFE91, 0xFE90]
    );
}

#[test]
fn non_arabic_text_is_untouched() {
    assert_eq!(reshape_arabic("HELLO 123"), "HELLO 123");
    assert_eq!(visual_order("HELLO"), "HELLO");
}

#[test]
fn visual_order_reverses_rtl_runs() {
    let shaped = reshape_arabic("\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}");
    let visual = visual_order(&shaped);
    assert_eq!(
        codepoints(&visual),
        vec![0xFE8E, 0xFE92, 0xFEA3, 0xFEAE, 0xFEE3]
    );
}

#[test]
fn locale_switch_changes_internal_ordering() {
    let word = "\u{0645}\u{0631}\u{062D}\u{0628}\u{0627}";
    let ltr = prepare_display_text(word, ScriptFamily::Latin);
    let rtl = prepare_display_text(word, ScriptFamily::RightToLeft);

    assert!(!ltr.reshaped);
    assert!(rtl.reshaped);
    assert_eq!(ltr.text, word);

    let ltr_chars: Vec<char> = ltr.visible_chars().collect();
    let rtl_chars: Vec<char> = rtl.visible_chars().collect();
    assert_eq!(ltr_chars.len(), rtl_chars.len());
    assert_ne!(ltr_chars, rtl_chars);
    assert!(rtl.text.starts_with('\u{202D}'));
    assert!(rtl.text.ends_with('\u{202C}'));
}

#[test]
fn preparation_is_deterministic() {
    let a = prepare_display_text("\u{0633}\u{0644}\u{0627}\u{0645}", ScriptFamily::RightToLeft);
    let b = prepare_display_text("\u{0633}\u{0644}\u{0627}\u{0645}", ScriptFamily::RightToLeft);
    assert_eq!(a, b);
}

#[test]
fn urdu_letters_take_contextual_forms() {
    // beh rreh alef: rreh joins only backwards, so alef stands alone
    assert_eq!(
        codepoints(&reshape_arabic("\u{0628}\u{0691}\u{0627}")),
        vec![0xFE91, 0xFB8D, 0xFE8D]
    );
    // heh goal + yeh barree
    assert_eq!(
        codepoints(&reshape_arabic("\u{06C1}\u{06D2}")),
        vec![0xFBA8, 0xFBAF]
    );
    // tteh keheh tteh
    assert_eq!(
        codepoints(&reshape_arabic("\u{0679}\u{06A9}\u{0679}")),
        vec![0xFB68, 0xFB91, 0xFB67]
    );
}

#[test]
fn urdu_word_is_reshaped_and_reordered_for_layout() {
    let shown = prepare_display_text("\u{0628}\u{0691}\u{0627}", ScriptFamily::RightToLeft);
    let visible: Vec<u32> = shown.visible_chars().map(|c| c as u32).collect();
    assert_eq!(visible, vec![0xFE8D, 0xFB8D, 0xFE91]);
}
