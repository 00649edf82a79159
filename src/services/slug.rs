//! Slug generation
//!
//! Every public detail route is addressed by slug (`/news/{slug}`,
//! `/umkm/{slug}` ...). Slugs are derived from the title or name when the
//! editor leaves them empty, and a numeric suffix keeps them unique.

use std::future::Future;

use super::ServiceError;

/// Upper bound on `-N` suffixes tried before giving up
const MAX_SUFFIX: u32 = 10_000;

/// Generate a URL-friendly slug
///
/// Lowercases, turns spaces, punctuation and other separators into `-`,
/// collapses runs of `-` and trims them from both ends. Non-ASCII letters
/// are kept as they are.
pub fn generate_slug(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        let keep = c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphanumeric());
        if keep {
            if pending_hyphen && !result.is_empty() {
                result.push('-');
            }
            pending_hyphen = false;
            result.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    result
}

/// Find the first free slug among `base`, `base-2`, `base-3`, ...
pub async fn ensure_unique<F, Fut>(base: &str, exists: F) -> anyhow::Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    if !exists(base.to_string()).await? {
        return Ok(base.to_string());
    }
    for n in 2..=MAX_SUFFIX {
        let candidate = format!("{}-{}", base, n);
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
    anyhow::bail!("No free slug left for '{}'", base)
}

/// Pick the slug to store for a create or update.
///
/// - An explicit slug is normalized and must be free (`Duplicate` otherwise).
/// - Without one, an existing record keeps `current`.
/// - A new record gets a unique slug generated from `source`.
pub async fn resolve_slug<F, Fut>(
    requested: Option<&str>,
    source: &str,
    current: Option<&str>,
    exists: F,
) -> Result<String, ServiceError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let requested = requested.map(generate_slug).filter(|s| !s.is_empty());

    if let Some(slug) = requested {
        if current == Some(slug.as_str()) {
            return Ok(slug);
        }
        if exists(slug.clone()).await? {
            return Err(ServiceError::Duplicate(format!("Slug '{}' is already used", slug)));
        }
        return Ok(slug);
    }

    if let Some(current) = current {
        return Ok(current.to_string());
    }

    let base = generate_slug(source);
    if base.is_empty() {
        return Err(ServiceError::Validation(
            "Cannot derive a slug, please provide one".to_string(),
        ));
    }
    Ok(ensure_unique(&base, exists).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_slug_simple() {
        assert_eq!(generate_slug("Festival Kopi Banyuanyar"), "festival-kopi-banyuanyar");
    }

    #[test]
    fn test_generate_slug_punctuation_and_spaces() {
        assert_eq!(generate_slug("  Panen Raya,  2024!! "), "panen-raya-2024");
        assert_eq!(generate_slug("Kerja_Bakti -- RT 03"), "kerja-bakti-rt-03");
        assert_eq!(generate_slug("---"), "");
    }

    #[test]
    fn test_generate_slug_keeps_non_ascii_letters() {
        assert_eq!(generate_slug("Café Désa"), "café-désa");
    }

    #[tokio::test]
    async fn test_ensure_unique_appends_suffix() {
        let taken: HashSet<String> = ["wisata".to_string(), "wisata-2".to_string()].into();
        let slug = ensure_unique("wisata", |c| {
            let hit = taken.contains(&c);
            async move { Ok::<_, anyhow::Error>(hit) }
        })
        .await
        .unwrap();
        assert_eq!(slug, "wisata-3");
    }

    #[tokio::test]
    async fn test_resolve_slug_rules() {
        let taken: HashSet<String> = ["batik-tulis".to_string()].into();
        let exists = |c: String| {
            let hit = taken.contains(&c);
            async move { Ok::<_, anyhow::Error>(hit) }
        };

        // generated and suffixed
        assert_eq!(
            resolve_slug(None, "Batik Tulis", None, exists).await.unwrap(),
            "batik-tulis-2"
        );
        // explicit and taken
        assert!(matches!(
            resolve_slug(Some("Batik Tulis"), "x", None, exists).await,
            Err(ServiceError::Duplicate(_))
        ));
        // explicit equal to the record's own slug
        assert_eq!(
            resolve_slug(Some("batik-tulis"), "x", Some("batik-tulis"), exists).await.unwrap(),
            "batik-tulis"
        );
        // update without slug keeps the current one
        assert_eq!(
            resolve_slug(Some("  "), "Judul Baru", Some("lama"), exists).await.unwrap(),
            "lama"
        );
        assert!(matches!(
            resolve_slug(None, "!!!", None, exists).await,
            Err(ServiceError::Validation(_))
        ));
    }

    proptest! {
        #[test]
        fn generated_slugs_are_url_safe(input in "\\PC{0,60}") {
            let slug = generate_slug(&input);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(slug.chars().all(|c| c == '-' || c.is_alphanumeric()));
            prop_assert_eq!(slug.to_lowercase(), slug.clone());
        }

        #[test]
        fn generate_slug_is_idempotent(input in "[A-Za-z0-9 ,.!_-]{0,40}") {
            let once = generate_slug(&input);
            prop_assert_eq!(generate_slug(&once), once.clone());
        }
    }
}
