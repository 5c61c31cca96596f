//! Catalog item types.

use cupcake_core::{CatalogEntry, CupcakeId, Price};

/// URL prefix under which uploaded catalog images are served.
pub const IMAGE_URL_PREFIX: &str = "/imagens";

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cupcake {
    /// Catalog ID.
    pub id: CupcakeId,
    /// Display name.
    pub name: String,
    /// Description shown in the storefront.
    pub description: String,
    /// Current unit price, always positive.
    pub price: Price,
    /// File name of the image inside the upload directory.
    pub image: String,
    /// Inactive items are hidden from the storefront but kept for order history.
    pub active: bool,
}

impl Cupcake {
    /// Public URL of the item image.
    #[must_use]
    pub fn image_url(&self) -> String {
        format!("{IMAGE_URL_PREFIX}/{}", self.image)
    }
}

impl CatalogEntry for Cupcake {
    fn catalog_id(&self) -> CupcakeId {
        self.id
    }

    fn unit_price(&self) -> Price {
        self.price
    }
}

/// Validated fields for creating or editing a catalog item.
#[derive(Debug, Clone)]
pub struct CupcakeInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    /// New image file name, if one was uploaded.
    pub image: Option<String>,
    pub active: bool,
}

/// A catalog item as listed in the administration panel.
#[derive(Debug, Clone)]
pub struct CupcakeListing {
    pub cupcake: Cupcake,
    /// Average rating of rated orders containing the item.
    pub average_rating: Option<f64>,
    /// Whether any order line references the item.
    pub sold: bool,
}

impl CupcakeListing {
    /// Average rating with one decimal, or `-` when nobody rated it yet.
    #[must_use]
    pub fn rating_display(&self) -> String {
        self.average_rating
            .map_or_else(|| "-".to_string(), |avg| format!("{avg:.1}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Cupcake {
        Cupcake {
            id: CupcakeId::new(3),
            name: "Red Velvet".to_string(),
            description: "Massa aveludada".to_string(),
            price: Price::from_cents(900),
            image: "red-velvet.jpg".to_string(),
            active: true,
        }
    }

    #[test]
    fn test_image_url() {
        assert_eq!(sample().image_url(), "/imagens/red-velvet.jpg");
    }

    #[test]
    fn test_rating_display() {
        let mut listing = CupcakeListing {
            cupcake: sample(),
            average_rating: None,
            sold: false,
        };
        assert_eq!(listing.rating_display(), "-");
        listing.average_rating = Some(4.26);
        assert_eq!(listing.rating_display(), "4.3");
    }
}
