//! # Inflector - Word Splitting and Case Conversion
//!
//! A tiny helper that derives identifiers from type and attribute names, used by
//! the relation helpers in `opaque` to build conventional key names such as
//! `postId` from a model called `Post`.
//!
//! ## How Words Are Found
//!
//! Input is split by a fixed pipeline of normalizers, each applied to the output
//! of the previous one:
//!
//! 1. Split on `-`
//! 2. Split on `_`
//! 3. Split before every character that is not lowercase (`fooBar` → `foo`, `Bar`)
//! 4. Lowercase every word
//!
//! Empty words are dropped at the end, so `"__Post--Id"` normalizes to
//! `["post", "id"]`.
//!
//! ## Quick Example
//!
//! ```rust
//! use opaque_inflector::{camelize, dasherize, pascalize};
//!
//! assert_eq!(camelize(["Post", "id"]), "postId");
//! assert_eq!(pascalize("blog_post"), "BlogPost");
//! assert_eq!(dasherize("BlogPost"), "blog-post");
//! ```
//!
//! Every conversion accepts either a single string or a list of parts; parts are
//! normalized independently and then concatenated.

/// Something that can be broken into words: a single string or a list of parts.
pub trait Words {
    fn into_parts(self) -> Vec<String>;
}

impl Words for &str {
    fn into_parts(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Words for String {
    fn into_parts(self) -> Vec<String> {
        vec![self]
    }
}

impl<S: AsRef<str>> Words for &[S] {
    fn into_parts(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> Words for [S; N] {
    fn into_parts(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> Words for Vec<S> {
    fn into_parts(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

fn split_on(separator: char) -> impl Fn(&str) -> Vec<String> {
    move |value| value.split(separator).map(str::to_string).collect()
}

fn split_on_case(value: &str) -> Vec<String> {
    let mut words = vec![String::new()];
    for c in value.chars() {
        if !c.is_lowercase() {
            words.push(c.to_string());
        } else if let Some(last) = words.last_mut() {
            last.push(c);
        }
    }
    words
}

fn lowercase(value: &str) -> Vec<String> {
    vec![value.to_lowercase()]
}

/// Split the input into lowercase words.
pub fn normalize<W: Words>(value: W) -> Vec<String> {
    let normalizers: [&dyn Fn(&str) -> Vec<String>; 4] = [
        &split_on('-'),
        &split_on('_'),
        &split_on_case,
        &lowercase,
    ];

    normalizers
        .iter()
        .fold(value.into_parts(), |words, normalizer| {
            words
                .iter()
                .flat_map(|word| normalizer(word.as_str()))
                .collect()
        })
        .into_iter()
        .filter(|word| !word.is_empty())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `blog_post` → `BlogPost`
pub fn pascalize<W: Words>(value: W) -> String {
    normalize(value).iter().map(|word| capitalize(word)).collect()
}

/// `blog_post` → `blogPost`
pub fn camelize<W: Words>(value: W) -> String {
    let pascal = pascalize(value);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `BlogPost` → `blog-post`
pub fn dasherize<W: Words>(value: W) -> String {
    normalize(value).join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_splits_all_separators() {
        assert_eq!(normalize("blog-post_titleText"), vec!["blog", "post", "title", "text"]);
    }

    #[test]
    fn test_normalize_drops_empty_words() {
        assert_eq!(normalize("__Post--Id"), vec!["post", "id"]);
        assert!(normalize("").is_empty());
    }

    #[test]
    fn test_normalize_treats_every_capital_as_boundary() {
        assert_eq!(normalize("HTTPServer"), vec!["h", "t", "t", "p", "server"]);
    }

    #[test]
    fn test_camelize_parts() {
        assert_eq!(camelize(["Post", "id"]), "postId");
        assert_eq!(camelize(vec!["BlogPost", "id"]), "blogPostId");
    }

    #[test]
    fn test_camelize_empty_is_empty() {
        assert_eq!(camelize(""), "");
    }

    #[test]
    fn test_pascalize() {
        assert_eq!(pascalize("blog_post"), "BlogPost");
        assert_eq!(pascalize("blogPost"), "BlogPost");
    }

    #[test]
    fn test_dasherize() {
        assert_eq!(dasherize("BlogPost"), "blog-post");
        assert_eq!(dasherize(["user", "Profile_id"]), "user-profile-id");
    }
}
