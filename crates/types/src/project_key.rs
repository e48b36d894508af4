/// Derive a project key from a display name.
///
/// Letters are uppercased, decimal digits are kept, every other character
/// becomes `_`. Numeric symbols such as `½` or the letter-like `Ⅷ` are not
/// digits. For example `"My Project #1"` becomes `"MY_PROJECT__1"`.
pub fn generate_project_key(project_name: &str) -> String {
    let mut key = String::with_capacity(project_name.len());
    for character in project_name.chars() {
        if character.is_alphabetic() && !character.is_numeric() {
            key.extend(character.to_uppercase());
        } else if character.is_ascii_digit() {
            key.push(character);
        } else {
            key.push('_');
        }
    }
    key
}
