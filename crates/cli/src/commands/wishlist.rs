//! Wishlist commands.

use std::fmt::Write as _;

use honeywell_core::{ProductId, ShopperSession, WishlistStore};

use super::{CommandError, money};
use crate::catalog::{ProductLookup, wishlist_input};

/// Save a product for later. Saving twice is a no-op.
///
/// # Errors
///
/// Returns an error if the product is unknown.
pub fn add(
    session: &mut ShopperSession,
    lookup: &ProductLookup,
    slug: &str,
) -> Result<String, CommandError> {
    let product = lookup
        .by_slug(slug)
        .ok_or_else(|| CommandError::UnknownProduct(slug.to_owned()))?;

    if session.wishlist().is_in_wishlist(&product.id) {
        return Ok(format!("{} is already in your wishlist", product.name));
    }

    session.wishlist_mut().add_item(wishlist_input(product));
    Ok(format!("Saved {} to wishlist", product.name))
}

/// # Errors
///
/// Returns an error if the product is not saved.
pub fn remove(session: &mut ShopperSession, slug: &str) -> Result<String, CommandError> {
    let product_id = find_entry(session.wishlist(), slug)?;
    session.wishlist_mut().remove_item(&product_id);
    Ok(format!("Removed {slug} from wishlist"))
}

pub fn clear(session: &mut ShopperSession) -> String {
    session.wishlist_mut().clear_wishlist();
    "Wishlist cleared".to_owned()
}

/// Move a saved product into the cart as one unit of the base product.
///
/// # Errors
///
/// Returns an error if the product is not saved.
pub fn move_to_cart(session: &mut ShopperSession, slug: &str) -> Result<String, CommandError> {
    let product_id = find_entry(session.wishlist(), slug)?;
    if !session.move_to_cart(&product_id) {
        return Err(CommandError::NotInWishlist(slug.to_owned()));
    }
    Ok(format!(
        "Moved {slug} to cart ({} items)",
        session.cart().item_count()
    ))
}

/// Human-readable wishlist listing, or the snapshot as JSON.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn show(session: &ShopperSession, json: bool) -> Result<String, CommandError> {
    let wishlist = session.wishlist();
    if json {
        return Ok(serde_json::to_string_pretty(&wishlist.snapshot())?);
    }
    Ok(render(wishlist))
}

fn render(wishlist: &WishlistStore) -> String {
    if wishlist.items().is_empty() {
        return "Your wishlist is empty".to_owned();
    }

    let mut out = format!("Wishlist ({} items)", wishlist.item_count());
    for entry in wishlist.items() {
        let _ = write!(
            out,
            "\n  {:<44} {:>12}  saved {}",
            entry.product_name,
            money(entry.price),
            entry.added_at.format("%Y-%m-%d")
        );
    }
    out
}

fn find_entry(wishlist: &WishlistStore, slug: &str) -> Result<ProductId, CommandError> {
    wishlist
        .items()
        .iter()
        .find(|e| e.product_slug == slug)
        .map(|e| e.product_id.clone())
        .ok_or_else(|| CommandError::NotInWishlist(slug.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use honeywell_core::MemorySlot;

    use super::*;
    use crate::catalog::tests::lookup;

    fn session() -> ShopperSession {
        ShopperSession::load(MemorySlot::new().shared())
    }

    #[test]
    fn test_add_twice_keeps_one_entry() {
        let mut session = session();
        let lookup = lookup();

        add(&mut session, &lookup, "volt-power-bank").unwrap();
        let message = add(&mut session, &lookup, "volt-power-bank").unwrap();

        assert_eq!(session.wishlist().item_count(), 1);
        assert!(message.contains("already"));
    }

    #[test]
    fn test_move_to_cart() {
        let mut session = session();
        add(&mut session, &lookup(), "moxie-wireless-earbuds").unwrap();

        move_to_cart(&mut session, "moxie-wireless-earbuds").unwrap();

        assert_eq!(session.wishlist().item_count(), 0);
        assert_eq!(session.cart().item_count(), 1);
        assert_eq!(session.cart().items()[0].variant_id, None);

        assert!(matches!(
            move_to_cart(&mut session, "moxie-wireless-earbuds"),
            Err(CommandError::NotInWishlist(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut session = session();
        let lookup = lookup();
        add(&mut session, &lookup, "volt-power-bank").unwrap();
        add(&mut session, &lookup, "moxie-wireless-earbuds").unwrap();

        remove(&mut session, "volt-power-bank").unwrap();
        assert_eq!(session.wishlist().item_count(), 1);

        clear(&mut session);
        assert_eq!(show(&session, false).unwrap(), "Your wishlist is empty");
    }

    #[test]
    fn test_show_lists_entries() {
        let mut session = session();
        add(&mut session, &lookup(), "volt-power-bank").unwrap();

        let text = show(&session, false).unwrap();
        assert!(text.starts_with("Wishlist (1 items)"));
        assert!(text.contains("Volt Power Bank"));
        assert!(text.contains("₹1299.00"));
    }
}
