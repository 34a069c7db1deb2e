//! Caption rendering as seen by channel subscribers

use promo_dispatch::catalog::PromotionalItem;
use promo_dispatch::render::render_caption;

use super::support::tenis;

#[test]
fn example_row_renders_all_values_and_strikes_old_price() {
    let item = PromotionalItem {
        row: 2,
        name: "Tênis X".to_string(),
        old_price: "R$200".to_string(),
        promo_price: "R$99".to_string(),
        coupon: "FROG10".to_string(),
        link: "http://x.test/a".to_string(),
        ..Default::default()
    };

    let caption = render_caption(&item, &item.link);

    assert!(caption.contains("Tênis X"));
    assert!(caption.contains("R$99"));
    assert!(caption.contains("FROG10"));
    assert!(caption.contains("http://x.test/a"));
    assert!(caption.contains("<s>R$200</s>"));
}

#[test]
fn promo_price_is_highlighted_and_coupon_italic() {
    let caption = render_caption(&tenis(), "http://x.test/a");

    assert!(caption.contains("<b>Por: R$99 😍</b>"));
    assert!(caption.contains("<i>CUPOM: FROG10 ✨</i>"));
    assert!(caption.ends_with("Compre aqui:\n🛍️ http://x.test/a"));
}

#[test]
fn rendered_link_is_the_one_passed_in() {
    let caption = render_caption(&tenis(), "https://s.test/q");

    assert!(caption.contains("https://s.test/q"));
    assert!(!caption.contains("http://x.test/a"));
}
