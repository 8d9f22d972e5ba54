/// Best similarity (0..=100) between the shorter string and any equally
/// long window of the longer one. Empty input scores 0.
///
/// Case-sensitive; callers lower-case both sides.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let needle: String = short.iter().collect();

    let mut best = 0.0f64;
    for start in 0..=(long.len() - short.len()) {
        let window: String = long[start..start + short.len()].iter().collect();
        let ratio = strsim::normalized_levenshtein(&needle, &window);
        if ratio > best {
            best = ratio;
            if best >= 1.0 {
                break;
            }
        }
    }
    (best * 100.0).round() as u8
}
