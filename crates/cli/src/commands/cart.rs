//! Cart commands.

use std::fmt::Write as _;

use honeywell_core::{CartStore, ProductId, ShopperSession, VariantId};

use super::{CommandError, money};
use crate::catalog::{ProductLookup, cart_input, find_variant};

/// Which cart line of a product a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSelector<'a> {
    /// The only line for the product.
    Any,
    /// The line without a variant.
    Base,
    /// The line for a variant, by ID or colour.
    Variant(&'a str),
}

impl<'a> LineSelector<'a> {
    #[must_use]
    pub const fn new(variant: Option<&'a str>, base: bool) -> Self {
        match (variant, base) {
            (_, true) => Self::Base,
            (Some(variant), false) => Self::Variant(variant),
            (None, false) => Self::Any,
        }
    }
}

/// Add `quantity` units of a product, optionally a specific variant.
///
/// # Errors
///
/// Returns an error if the product or variant is unknown, or the variant is
/// out of stock.
pub fn add(
    session: &mut ShopperSession,
    lookup: &ProductLookup,
    slug: &str,
    variant: Option<&str>,
    quantity: u32,
) -> Result<String, CommandError> {
    let product = lookup
        .by_slug(slug)
        .ok_or_else(|| CommandError::UnknownProduct(slug.to_owned()))?;

    let variant = variant
        .map(|wanted| {
            find_variant(product, wanted).ok_or_else(|| CommandError::UnknownVariant {
                product: slug.to_owned(),
                variant: wanted.to_owned(),
            })
        })
        .transpose()?;

    if let Some(v) = variant.filter(|v| !v.available) {
        return Err(CommandError::VariantUnavailable {
            product: slug.to_owned(),
            variant: v.color.clone(),
        });
    }

    session
        .cart_mut()
        .add_item(cart_input(product, variant), quantity);

    let cart = session.cart();
    Ok(format!(
        "Added {} to cart ({} items, {})",
        product.name,
        cart.item_count(),
        money(cart.total())
    ))
}

/// Remove a line from the cart.
///
/// # Errors
///
/// Returns an error if no single line matches.
pub fn remove(
    session: &mut ShopperSession,
    slug: &str,
    line: LineSelector<'_>,
) -> Result<String, CommandError> {
    let (product_id, variant_id) = find_line(session.cart(), slug, line)?;
    session
        .cart_mut()
        .remove_item(&product_id, variant_id.as_ref());
    Ok(format!("Removed {slug} from cart"))
}

/// Set a line's quantity. Zero or less removes the line.
///
/// # Errors
///
/// Returns an error if no single line matches.
pub fn update(
    session: &mut ShopperSession,
    slug: &str,
    line: LineSelector<'_>,
    quantity: i64,
) -> Result<String, CommandError> {
    let (product_id, variant_id) = find_line(session.cart(), slug, line)?;
    session
        .cart_mut()
        .update_quantity(&product_id, quantity, variant_id.as_ref());

    if quantity <= 0 {
        Ok(format!("Removed {slug} from cart"))
    } else {
        Ok(format!("Set {slug} quantity to {quantity}"))
    }
}

pub fn clear(session: &mut ShopperSession) -> String {
    session.cart_mut().clear_cart();
    "Cart cleared".to_owned()
}

/// Human-readable cart listing, or the snapshot as JSON.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn show(session: &ShopperSession, json: bool) -> Result<String, CommandError> {
    let cart = session.cart();
    if json {
        return Ok(serde_json::to_string_pretty(&cart.snapshot())?);
    }
    Ok(render(cart))
}

fn render(cart: &CartStore) -> String {
    if cart.items().is_empty() {
        return "Your cart is empty".to_owned();
    }

    let mut out = format!("Cart ({} items)\n", cart.item_count());
    for line in cart.items() {
        let name = line.variant_color.as_ref().map_or_else(
            || line.product_name.clone(),
            |color| format!("{} ({color})", line.product_name),
        );
        let _ = writeln!(
            out,
            "  {:>3} x {name:<40} {}",
            line.quantity,
            money(line.line_total())
        );
    }
    let _ = write!(out, "Total: {}", money(cart.total()));
    out
}

/// Resolve a cart line by product slug and line selector.
fn find_line(
    cart: &CartStore,
    slug: &str,
    selector: LineSelector<'_>,
) -> Result<(ProductId, Option<VariantId>), CommandError> {
    let mut lines = cart.items().iter().filter(|l| l.product_slug == slug);

    let line = match selector {
        LineSelector::Base => lines.find(|l| l.variant_id.is_none()),
        LineSelector::Variant(wanted) => lines.find(|l| {
            l.variant_id.as_ref().is_some_and(|id| id.as_str() == wanted)
                || l.variant_color
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        }),
        LineSelector::Any => {
            let first = lines.next();
            if lines.next().is_some() {
                return Err(CommandError::AmbiguousLine(slug.to_owned()));
            }
            first
        }
    };

    line.map(|l| (l.product_id.clone(), l.variant_id.clone()))
        .ok_or_else(|| CommandError::NotInCart(slug.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use honeywell_core::MemorySlot;
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::tests::lookup;

    fn session() -> ShopperSession {
        ShopperSession::load(MemorySlot::new().shared())
    }

    #[test]
    fn test_add_merges_and_reports_totals() {
        let mut session = session();
        let lookup = lookup();

        add(&mut session, &lookup, "volt-power-bank", None, 1).unwrap();
        let message = add(&mut session, &lookup, "volt-power-bank", None, 2).unwrap();

        assert_eq!(session.cart().items().len(), 1);
        assert_eq!(session.cart().item_count(), 3);
        assert_eq!(session.cart().total(), Decimal::new(3897, 0));
        assert!(message.contains("3 items"));
    }

    #[test]
    fn test_add_variant_by_colour() {
        let mut session = session();
        add(
            &mut session,
            &lookup(),
            "moxie-wireless-earbuds",
            Some("black"),
            1,
        )
        .unwrap();

        let line = &session.cart().items()[0];
        assert_eq!(line.variant_id, Some(VariantId::new("v-black")));
        assert_eq!(line.variant_color.as_deref(), Some("Black"));
    }

    #[test]
    fn test_add_rejects_unknown_and_unavailable() {
        let mut session = session();
        let lookup = lookup();

        assert!(matches!(
            add(&mut session, &lookup, "nope", None, 1),
            Err(CommandError::UnknownProduct(_))
        ));
        assert!(matches!(
            add(&mut session, &lookup, "moxie-wireless-earbuds", Some("red"), 1),
            Err(CommandError::UnknownVariant { .. })
        ));
        assert!(matches!(
            add(&mut session, &lookup, "moxie-wireless-earbuds", Some("white"), 1),
            Err(CommandError::VariantUnavailable { .. })
        ));
        assert!(session.cart().items().is_empty());
    }

    #[test]
    fn test_update_and_remove_by_slug() {
        let mut session = session();
        add(&mut session, &lookup(), "volt-power-bank", None, 1).unwrap();

        update(&mut session, "volt-power-bank", LineSelector::Any, 5).unwrap();
        assert_eq!(session.cart().item_count(), 5);

        update(&mut session, "volt-power-bank", LineSelector::Any, 0).unwrap();
        assert!(session.cart().items().is_empty());

        assert!(matches!(
            remove(&mut session, "volt-power-bank", LineSelector::Any),
            Err(CommandError::NotInCart(_))
        ));
    }

    #[test]
    fn test_ambiguous_line_needs_variant() {
        let mut session = session();
        let lookup = lookup();
        add(&mut session, &lookup, "moxie-wireless-earbuds", None, 1).unwrap();
        add(&mut session, &lookup, "moxie-wireless-earbuds", Some("v-black"), 1).unwrap();

        assert!(matches!(
            remove(&mut session, "moxie-wireless-earbuds", LineSelector::Any),
            Err(CommandError::AmbiguousLine(_))
        ));

        remove(
            &mut session,
            "moxie-wireless-earbuds",
            LineSelector::Variant("v-black"),
        )
        .unwrap();
        assert_eq!(session.cart().items().len(), 1);
        assert_eq!(session.cart().items()[0].variant_id, None);
    }

    #[test]
    fn test_base_line_reachable_beside_variant_line() {
        let mut session = session();
        let lookup = lookup();
        add(&mut session, &lookup, "moxie-wireless-earbuds", None, 1).unwrap();
        add(&mut session, &lookup, "moxie-wireless-earbuds", Some("v-black"), 1).unwrap();

        update(&mut session, "moxie-wireless-earbuds", LineSelector::Base, 5).unwrap();
        let base = session
            .cart()
            .items()
            .iter()
            .find(|l| l.variant_id.is_none())
            .unwrap();
        assert_eq!(base.quantity, 5);
        assert_eq!(session.cart().item_count(), 6);

        remove(&mut session, "moxie-wireless-earbuds", LineSelector::Base).unwrap();
        assert_eq!(session.cart().items().len(), 1);
        assert_eq!(
            session.cart().items()[0].variant_id,
            Some(VariantId::new("v-black"))
        );

        assert!(matches!(
            remove(&mut session, "moxie-wireless-earbuds", LineSelector::Base),
            Err(CommandError::NotInCart(_))
        ));
    }

    #[test]
    fn test_line_selector_from_flags() {
        assert_eq!(LineSelector::new(None, false), LineSelector::Any);
        assert_eq!(LineSelector::new(None, true), LineSelector::Base);
        assert_eq!(LineSelector::new(Some("white"), false), LineSelector::Variant("white"));
    }

    #[test]
    fn test_show_text_and_json() {
        let mut session = session();
        assert_eq!(show(&session, false).unwrap(), "Your cart is empty");

        add(&mut session, &lookup(), "volt-power-bank", None, 2).unwrap();
        let text = show(&session, false).unwrap();
        assert!(text.starts_with("Cart (2 items)"));
        assert!(text.ends_with("Total: ₹2598.00"));

        let json: serde_json::Value = serde_json::from_str(&show(&session, true).unwrap()).unwrap();
        assert_eq!(json["itemCount"], 2);
        assert_eq!(json["total"], "2598");
    }
}
