//! Strings the presentation layer renders around a session.
use crate::item::Item;

/// Full image URL for a provider image path, `{base}w{width}/{path}`.
///
/// The provider's paths start with a slash, which is dropped so the result
/// never contains `//` after the size segment.
#[must_use]
pub fn image_url(base: &str, width: u32, path: &str) -> String {
    format!("{base}w{width}/{}", path.trim_start_matches('/'))
}

#[must_use]
pub fn heading(first: &str, second: &str) -> String {
    format!("Link {first} to {second}")
}

#[must_use]
pub fn success_banner(links: usize) -> String {
    let noun = if links == 1 { "link" } else { "links" };
    format!("You did it in {links} {noun}!")
}

/// Movies render with their release year when known.
#[must_use]
pub fn item_title(item: &Item) -> String {
    match item {
        Item::Movie(movie) => movie
            .year
            .map_or_else(|| movie.name.clone(), |year| format!("{} ({year})", movie.name)),
        Item::Actor(actor) => actor.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Actor, Movie};

    #[test]
    fn image_urls_join_size_and_path() {
        assert_eq!(
            image_url("https://image.tmdb.org/t/p/", 154, "/abc.jpg"),
            "https://image.tmdb.org/t/p/w154/abc.jpg"
        );
        assert_eq!(image_url("", 92, "x.png"), "w92/x.png");
    }

    #[test]
    fn banner_pluralizes() {
        assert_eq!(success_banner(1), "You did it in 1 link!");
        assert_eq!(success_banner(3), "You did it in 3 links!");
        assert_eq!(heading("Kevin Bacon", "Tom Hanks"), "Link Kevin Bacon to Tom Hanks");
    }

    #[test]
    fn titles_carry_year() {
        assert_eq!(item_title(&Movie::new(1, "Diner", Some(1982)).into()), "Diner (1982)");
        assert_eq!(item_title(&Movie::new(2, "Untitled", None).into()), "Untitled");
        assert_eq!(item_title(&Actor::new(3, "Kevin Bacon").into()), "Kevin Bacon");
    }
}
