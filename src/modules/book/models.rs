use serde::{Deserialize, Serialize};

/// A catalogued book.
///
/// `id` is `None` until the record is first persisted; the storage layer
/// assigns it exactly once and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Storage-assigned identifier
    #[serde(default)]
    pub id: Option<i64>,
    /// Title of the book
    pub title: String,
    /// Reader rating
    pub rating: f64,
    /// Price in the smallest currency unit
    pub price: i32,
}

impl Book {
    /// Build a transient book that has not been persisted yet.
    pub fn new(title: impl Into<String>, rating: f64, price: i32) -> Self {
        Self {
            id: None,
            title: title.into(),
            rating,
            price,
        }
    }

    /// Copy the mutable fields from `patch`, leaving `id` untouched.
    pub fn apply(&mut self, patch: Book) {
        self.title = patch.title;
        self.rating = patch.rating;
        self.price = patch.price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_identifier() {
        let mut book = Book {
            id: Some(3),
            ..Book::new("Do it Android", 9.0, 14000)
        };
        let patch = Book {
            id: Some(99),
            ..Book::new("Do it Flutter", 9.5, 20000)
        };

        book.apply(patch);

        assert_eq!(book.id, Some(3));
        assert_eq!(book.title, "Do it Flutter");
        assert_eq!(book.rating, 9.5);
        assert_eq!(book.price, 20000);
    }

    #[test]
    fn id_is_optional_on_input() {
        let book: Book =
            serde_json::from_str(r#"{"title":"Do it React","rating":8.0,"price":15000}"#).unwrap();
        assert_eq!(book, Book::new("Do it React", 8.0, 15000));

        let book: Book =
            serde_json::from_str(r#"{"id":null,"title":"Do it React","rating":8.0,"price":15000}"#)
                .unwrap();
        assert_eq!(book.id, None);
    }
}
