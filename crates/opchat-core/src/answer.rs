//! Automated first-response heuristics.
//!
//! A pure function over the incoming text and a catalog snapshot, used when
//! no operator interaction is needed yet: price/delivery/hours questions
//! get canned answers, fuel keywords get matching catalog suggestions.

use opchat_types::config::{CatalogProduct, FuelKind};

const PRICE_KEYWORDS: &[&str] = &["narx", "price", "narxi", "qiymat"];
const DELIVERY_KEYWORDS: &[&str] = &["yetkaz", "delivery", "yetkazib"];
const HOURS_KEYWORDS: &[&str] = &["ish vaqti", "ishlash vaqti", "24/7", "24x7"];
const FUEL_KEYWORDS: &[&str] = &[
    "ai-95", "ai95", "95", "ai-92", "ai92", "92", "benzin", "dizel", "neft",
];

/// At most this many product names are listed in a suggestion.
const MAX_SUGGESTIONS: usize = 5;

/// Produce an automated reply for a visitor message.
///
/// Pure and side-effect free; the catalog is a snapshot the caller already
/// holds.
pub fn answer(message: &str, catalog: &[CatalogProduct]) -> String {
    let message = message.trim();
    if message.is_empty() {
        return "Savolingizni kiriting, yordam beraman.".to_string();
    }

    let lower = message.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if contains_any(PRICE_KEYWORDS) {
        return "Narxlar mahsulot turi va buyurtma hajmiga qarab belgilanadi. \
                Aniqlashtirish uchun +998 90 123 45 67 raqamiga murojaat qiling \
                yoki buyurtma tafsilotlarini yuboring."
            .to_string();
    }
    if contains_any(DELIVERY_KEYWORDS) {
        return "Toshkent bo'ylab ~2 soat, viloyatlar bo'ylab ~24 soatda \
                yetkazib beramiz. 24/7 buyurtmalar qabul qilinadi."
            .to_string();
    }
    if contains_any(HOURS_KEYWORDS) {
        return "Biz 24/7 ishlaymiz. Istalgan paytda murojaat qilishingiz mumkin."
            .to_string();
    }

    if contains_any(FUEL_KEYWORDS) {
        let kind = if lower.contains("dizel") {
            Some(FuelKind::Dizel)
        } else if ["benzin", "ai", "95", "92"].iter().any(|k| lower.contains(k)) {
            Some(FuelKind::Benzin)
        } else if lower.contains("neft") {
            Some(FuelKind::Neft)
        } else {
            None
        };

        let names: Vec<&str> = catalog
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .take(MAX_SUGGESTIONS)
            .map(|p| p.name.as_str())
            .collect();

        if !names.is_empty() {
            return format!(
                "Quyidagi mahsulotlar mos bo'lishi mumkin: {}. Batafsil uchun \
                 katalog bo'limidan tanlang yoki hajm/manzil yuboring.",
                names.join(", ")
            );
        }
    }

    "Savolingizni aniqroq yozing (mahsulot turi, kerakli hajm, manzil). \
     Yetkazib berish 24/7. Qo'shimcha ma'lumot: +998 90 123 45 67."
        .to_string()
}
