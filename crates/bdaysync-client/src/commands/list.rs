//! `bdaysync list`.

use std::io::{self, Write};

use crate::config::ClientConfig;
use crate::engine::BirthdayListing;
use crate::error::ClientResult;

/// Prints the normalized birthdays in sync order.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let engine = super::build_engine(config)?;
    let listing = engine.list_birthdays().await?;
    write_listing(&mut io::stdout().lock(), &listing)?;
    Ok(())
}

pub fn write_listing(out: &mut impl Write, listing: &BirthdayListing) -> io::Result<()> {
    for birthday in &listing.birthdays {
        writeln!(out, "{}: {}", birthday.name, birthday.canonical_date())?;
    }
    if listing.truncated {
        writeln!(
            out,
            "({} contacts fetched; more are available with `follow_pages = true`)",
            listing.contacts_fetched
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdaysync_core::{CanonicalDate, NormalizedBirthday};

    #[test]
    fn one_line_per_birthday() {
        let listing = BirthdayListing {
            birthdays: vec![
                NormalizedBirthday::new("Alice", CanonicalDate::new(None, 3, 7).unwrap()),
                NormalizedBirthday::new("Bob", CanonicalDate::new(Some(1985), 2, 29).unwrap()),
            ],
            contacts_fetched: 3,
            truncated: false,
        };

        let mut out = Vec::new();
        write_listing(&mut out, &listing).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Alice: 03-07\nBob: 1985-02-29\n"
        );
    }

    #[test]
    fn truncated_listing_says_so() {
        let listing = BirthdayListing {
            contacts_fetched: 200,
            truncated: true,
            ..Default::default()
        };

        let mut out = Vec::new();
        write_listing(&mut out, &listing).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("200 contacts fetched"));
    }
}
