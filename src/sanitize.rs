/// Returns false if any token, once spaces are removed, contains a
/// non-alphanumeric character. Command arguments are interpolated into a
/// substring match and into the `name@server` composite key, so anything
/// beyond letters, digits and spaces is rejected before the store is touched.
pub fn sanitize<S: AsRef<str>>(tokens: &[S]) -> bool {
    tokens.iter().all(|token| {
        token
            .as_ref()
            .chars()
            .filter(|c| *c != ' ')
            .all(char::is_alphanumeric)
    })
}
