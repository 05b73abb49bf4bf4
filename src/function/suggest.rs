//!
//! The method name verification and suggestions.
//!

use crate::error::Error;

use super::Func;

/// The minimal Jaro-Winkler similarity of a suggested method name.
pub const MIN_SIMILARITY: f64 = 0.8;

/// The maximal number of suggested method names.
pub const MAX_SUGGESTIONS: usize = 3;

///
/// Checks that the method signature names an external function of the contracts.
///
/// The error suggests the functions with the same name first, and the functions with
/// similar names if there are none.
///
pub fn verify_method<'a, P, I>(method: &str, public: P, internal: I) -> Result<(), Error>
where
    P: IntoIterator<Item = &'a Func>,
    I: IntoIterator<Item = &'a Func>,
{
    let name = method.split('(').next().unwrap_or_default();
    let signature = method.replace(' ', "");

    let public: Vec<&Func> = public.into_iter().collect();
    let mut suggestions = Vec::new();
    for function in public.iter().filter(|function| function.name.as_str() == name) {
        let function_signature = function.signature();
        if function_signature == signature {
            return Ok(());
        }
        push_unique(&mut suggestions, function_signature);
    }

    if let Some(function) = internal
        .into_iter()
        .find(|function| function.name.as_str() == name && function.signature() == signature)
    {
        return Err(Error::user_input(format!(
            "Method {} is {}. Please change it to external or public",
            signature, function.visibility
        )));
    }

    if suggestions.is_empty() {
        let mut names: Vec<&str> = public.iter().map(|function| function.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        for closest in closest_names(name, names.as_slice()) {
            for function in public.iter().filter(|function| function.name.as_str() == closest) {
                push_unique(&mut suggestions, function.signature());
            }
        }
    }

    if suggestions.is_empty() {
        return Err(Error::user_input(format!("Method {} was not found", method)));
    }
    Err(Error::user_input(format!(
        "Method {} was not found. Maybe you meant {}?",
        method,
        join_alternatives(suggestions.as_slice())
    )))
}

///
/// Returns the names similar to `name`, the most similar first.
///
pub fn closest_names<'a>(name: &str, names: &[&'a str]) -> Vec<&'a str> {
    let mut scored: Vec<(&'a str, f64)> = names
        .iter()
        .map(|candidate| (*candidate, strsim::jaro_winkler(name, candidate)))
        .filter(|(_, score)| *score >= MIN_SIMILARITY)
        .collect();
    scored.sort_by(|left, right| right.1.total_cmp(&left.1).then_with(|| left.0.cmp(right.0)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(candidate, _)| candidate)
        .collect()
}

///
/// Joins the alternatives as `A`, `A or B`, or `A, B, or C`.
///
fn join_alternatives(alternatives: &[String]) -> String {
    match alternatives {
        [] => String::new(),
        [single] => single.to_owned(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}

fn push_unique(suggestions: &mut Vec<String>, signature: String) {
    if !suggestions.contains(&signature) {
        suggestions.push(signature);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::function::tests::func;
    use crate::function::visibility::Visibility;

    const NONE: [crate::function::Func; 0] = [];

    fn message(result: Result<(), Error>) -> String {
        match result {
            Err(Error::UserInput(message)) => message,
            result => panic!("Unexpected result: {:?}", result),
        }
    }

    #[test]
    fn exact_match_ignores_spaces() {
        let public = vec![func("transfer", &["address", "uint256"], Visibility::External)];
        assert!(super::verify_method("transfer(address, uint256)", &public, &NONE).is_ok());
    }

    #[test]
    fn same_name_is_suggested() {
        let public = vec![
            func("transfer", &["address", "uint256"], Visibility::External),
            func("transfer", &["address"], Visibility::Public),
        ];
        assert_eq!(
            message(super::verify_method("transfer(uint256)", &public, &NONE)),
            "Method transfer(uint256) was not found. Maybe you meant transfer(address,uint256) or transfer(address)?"
        );
    }

    #[test]
    fn internal_method_is_reported() {
        let internal = vec![func("_mint", &["address", "uint256"], Visibility::Internal)];
        assert_eq!(
            message(super::verify_method("_mint(address,uint256)", &NONE, &internal)),
            "Method _mint(address,uint256) is internal. Please change it to external or public"
        );
    }

    #[test]
    fn similar_names_are_suggested() {
        let public = vec![
            func("transfer", &["address", "uint256"], Visibility::External),
            func("balanceOf", &["address"], Visibility::External),
        ];
        assert_eq!(
            message(super::verify_method("transfr(address,uint256)", &public, &NONE)),
            "Method transfr(address,uint256) was not found. Maybe you meant transfer(address,uint256)?"
        );
    }

    #[test]
    fn nothing_similar() {
        let public = vec![func("balanceOf", &["address"], Visibility::External)];
        assert_eq!(
            message(super::verify_method("mint()", &public, &NONE)),
            "Method mint() was not found"
        );
    }

    #[test]
    fn three_alternatives() {
        let alternatives = vec!["a()".to_owned(), "b()".to_owned(), "c()".to_owned()];
        assert_eq!(super::join_alternatives(alternatives.as_slice()), "a(), b(), or c()");
    }
}
