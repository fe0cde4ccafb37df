//! Director fields that name several people.
//!
//! A catalog director field such as `"Joel Coen, Ethan Coen"` is resolved one
//! name at a time and merged back into a single record for display.

use crate::records::DirectorRecord;

const SEPARATORS: [char; 2] = [',', ';'];

/// The people named by a catalog director field, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorGroup {
    field: Box<str>,
    members: Vec<Box<str>>,
}

impl DirectorGroup {
    /// Split a director field into member names.
    ///
    /// Names are separated by `,`, `;` or ` & `. Names are trimmed; blank and
    /// repeated names are dropped. Returns `None` when no name remains.
    #[must_use]
    pub fn parse(field: &str) -> Option<Self> {
        let normalized = field.replace(" & ", ",");
        let mut members: Vec<Box<str>> = Vec::new();
        for name in normalized.split(SEPARATORS).map(str::trim) {
            if name.is_empty() || members.iter().any(|known| known.as_ref() == name) {
                continue;
            }
            members.push(name.into());
        }

        if members.is_empty() {
            return None;
        }
        Some(Self {
            field: field.trim().into(),
            members,
        })
    }

    /// Member names in input order.
    #[must_use]
    pub fn members(&self) -> &[Box<str>] {
        &self.members
    }

    /// Returns true when the field names more than one person.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.members.len() > 1
    }

    /// The field as written in the catalog.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Merge per-member records (aligned with [`Self::members`]) into one.
    ///
    /// A single-member group returns that member's record. For real groups the
    /// biography is one `name: biography` block per resolved member, in input
    /// order, separated by blank lines; the photo is the first one found.
    /// Returns `None` when no member resolved.
    #[must_use]
    pub fn merge(&self, resolved: Vec<Option<DirectorRecord>>) -> Option<DirectorRecord> {
        if !self.is_group() {
            return resolved.into_iter().next().flatten();
        }

        let mut blocks = Vec::new();
        let mut photo = None;
        for (name, record) in self.members.iter().zip(resolved) {
            let Some(record) = record else {
                continue;
            };
            blocks.push(format!("{name}: {}", record.biography));
            if photo.is_none() {
                photo = record.photo;
            }
        }

        if blocks.is_empty() {
            return None;
        }
        Some(DirectorRecord {
            name: self.field.clone(),
            biography: blocks.join("\n\n").into_boxed_str(),
            photo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, photo: Option<&str>) -> DirectorRecord {
        DirectorRecord {
            name: name.into(),
            biography: format!("bio of {name}").into_boxed_str(),
            photo: photo.map(Into::into),
        }
    }

    #[test]
    fn splits_on_all_separators() {
        let group = DirectorGroup::parse("Lana Wachowski & Lilly Wachowski; Tom Tykwer,");
        let names: Vec<&str> = group
            .as_ref()
            .map(|group| group.members().iter().map(|name| &**name).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["Lana Wachowski", "Lilly Wachowski", "Tom Tykwer"]);
    }

    #[test]
    fn blank_fields_have_no_group() {
        assert_eq!(DirectorGroup::parse(" , ; "), None);
    }

    #[test]
    fn single_director_passes_record_through() {
        let group = DirectorGroup::parse("Ridley Scott");
        let merged = group.and_then(|group| group.merge(vec![Some(record("Ridley Scott", None))]));
        assert_eq!(merged, Some(record("Ridley Scott", None)));
    }

    #[test]
    fn group_biography_keeps_input_order_and_first_photo() {
        let group = DirectorGroup::parse("A, B");
        assert!(group.as_ref().is_some_and(DirectorGroup::is_group));

        let merged = group
            .as_ref()
            .and_then(|group| group.merge(vec![Some(record("A", None)), Some(record("B", Some("b.jpg")))]));
        assert_eq!(
            merged,
            Some(DirectorRecord {
                name: "A, B".into(),
                biography: "A: bio of A\n\nB: bio of B".into(),
                photo: Some("b.jpg".into()),
            })
        );

        let merged = group.and_then(|group| {
            group.merge(vec![
                Some(record("A", Some("a.jpg"))),
                Some(record("B", Some("b.jpg"))),
            ])
        });
        assert_eq!(merged.and_then(|record| record.photo).as_deref(), Some("a.jpg"));
    }

    #[test]
    fn group_with_no_resolved_member_is_unavailable() {
        let merged = DirectorGroup::parse("A, B").and_then(|group| group.merge(vec![None, None]));
        assert_eq!(merged, None);
    }
}
