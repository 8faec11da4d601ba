//! Demo melody for playing without a microphone.

/// Glicol composition: a slow sine melody inside the voice band
/// (G3 up to E4), with decays long enough to hold a stable pitch.
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 1.5 >> seq 55 _57 60 _64 62 _59 57 _52
~amp: ~gate >> envperc 0.01 0.6
~pit: ~gate >> mul 261.63
~voice: sin ~pit >> mul ~amp >> mul 0.3
o: ~voice >> plate 0.05
"#;
