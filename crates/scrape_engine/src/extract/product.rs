use std::collections::HashSet;

use regex::Regex;
use scrape_core::ProductRecord;
use scraper::{Html, Selector};
use url::Url;

use super::{clean_text, first_text, selector, selectors, ProductExtractor};
use crate::browser::PageContent;
use crate::ExtractError;

const TITLE: &[&str] = &["#productTitle", "#title"];

const PRICE: &[&str] = &[
    "#corePrice_feature_div .a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    "#sns-base-price",
    "#newBuyBoxPrice",
    ".a-price .a-offscreen",
    ".a-price-whole",
    "#apex_desktop .a-price .a-offscreen",
    "#buybox .a-price .a-offscreen",
    ".a-price-range .a-offscreen",
];

const IMAGES: &str = r#"#altImages img, #imgTagWrapperId img, img[src*="images-I"][srcset], img[src*="SL1500"]"#;

const AVAILABILITY: &str = "#availability, #availabilityInsideBuyBox_feature_div, #outOfStock";
const ADD_TO_CART: &str = "#add-to-cart-button, #buy-now-button";

const IN_STOCK_PHRASES: &[&str] = &[
    "in stock",
    "available",
    "ready to ship",
    "stokta",
    "stokta var",
    "auf lager",
    "lieferbar",
    "en stock",
    "disponible",
    "disponibile",
    "em estoque",
    "現在在庫あり",
    "在庫あり",
    "有庫存",
    "有货",
];

const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "out of stock",
    "unavailable",
    "temporarily unavailable",
    "currently unavailable",
    "stokta yok",
    "geçici olarak temin edilemiyor",
    "nicht auf lager",
    "derzeit nicht verfügbar",
    "momentan nicht verfügbar",
    "actuellement indisponible",
    "indisponible",
    "non disponibile",
    "no disponible",
    "sem estoque",
    "一時的に在庫切れ",
    "在庫切れ",
    "无货",
    "暂时无货",
];

const SELLER_LINK: &str =
    r#"a[href*="/sp?"], a[href*="/stores/"], a[href*="/seller/"], a[href*="/s?me="]"#;
const FULFILLED_BY_AMAZON: &str = "#fulfillerBadge_feature_div, .fulfilled-by-amazon, .a-icon-prime";

const PRIME_BADGES: &[&str] = &[
    "#primeBadgeIcon",
    ".a-icon-prime",
    ".prime-tag",
    ".a-icon-prime-badge",
    ".prime-logo",
    r#"i[aria-label*="Prime"]"#,
    r#"[data-a-badge-type="prime"]"#,
    ".a-badge-prime",
    "#deliveryDisplayFeature .a-icon-prime",
    "#mir-layout-DELIVERY_BLOCK .a-icon-prime",
    ".prime-checkout-tooltip",
];

const DELIVERY_MESSAGES: &[&str] = &[
    "#mir-layout-DELIVERY_BLOCK-slot-PRIMARY_DELIVERY_MESSAGE_LARGE",
    "#fast-track-message",
    "#promise-ship-date",
    "#deliveryBlockMessage",
    "#deliveryDisplayFeature",
    "#delivery-block-msg",
    ".a-color-success",
    "#mir-layout-DELIVERY_BLOCK",
];

const MERCHANT_BLOCKS: &str =
    r#"#fulfillerBadge_feature_div, .fulfilled-by-amazon, [data-feature-name="merchant"]"#;

struct Patterns {
    symbol_first: Regex,
    code_first: Regex,
    amount_first: Regex,
    amount_code: Regex,
    number: Regex,
    url_asin: Regex,
    bare_asin: Regex,
    sold_by: Vec<Regex>,
    sold_by_label: Regex,
    image_size_tokens: Vec<Regex>,
    fast_delivery: Regex,
    prime_membership: Regex,
    fulfilled_by_amazon: Regex,
}

struct Selectors {
    title: Vec<Selector>,
    price: Vec<Selector>,
    asin_input: Selector,
    detail_bullets_items: Selector,
    images: Selector,
    availability: Selector,
    add_to_cart: Selector,
    seller_trigger: Selector,
    buybox_rows: Selector,
    merchant_info: Selector,
    seller_link: Selector,
    fulfilled_by_amazon: Selector,
    breadcrumbs: Selector,
    feature_bullets: Selector,
    description: Selector,
    prime_badges: Vec<Selector>,
    delivery_messages: Vec<Selector>,
    body: Selector,
    merchant_blocks: Selector,
}

/// Field extraction for Amazon product detail pages.
pub struct AmazonProductExtractor {
    sel: Selectors,
    re: Patterns,
}

fn regex(pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|err| ExtractError::new(format!("pattern {pattern}: {err}")))
}

impl AmazonProductExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let sel = Selectors {
            title: selectors(TITLE)?,
            price: selectors(PRICE)?,
            asin_input: selector("#ASIN")?,
            detail_bullets_items: selector("#detailBullets_feature_div li")?,
            images: selector(IMAGES)?,
            availability: selector(AVAILABILITY)?,
            add_to_cart: selector(ADD_TO_CART)?,
            seller_trigger: selector("#sellerProfileTriggerId")?,
            buybox_rows: selector(
                "#tabular-buybox .tabular-buybox-container, #tabular-buybox [tabular-attribute-name]",
            )?,
            merchant_info: selector("#merchant-info")?,
            seller_link: selector(SELLER_LINK)?,
            fulfilled_by_amazon: selector(FULFILLED_BY_AMAZON)?,
            breadcrumbs: selector("#wayfinding-breadcrumbs_feature_div ul a")?,
            feature_bullets: selector("#feature-bullets li")?,
            description: selector("#productDescription")?,
            prime_badges: selectors(PRIME_BADGES)?,
            delivery_messages: selectors(DELIVERY_MESSAGES)?,
            body: selector("body")?,
            merchant_blocks: selector(MERCHANT_BLOCKS)?,
        };
        let re = Patterns {
            symbol_first: regex(r"(C\$|A\$|د\.إ|[$€£¥₹₺¢])\s*([0-9][0-9,.]*)")?,
            code_first: regex(r"\b([A-Z]{3})\s*([0-9][0-9,.]*)")?,
            amount_first: regex(r"([0-9][0-9,.]*)\s*([$€£¥₹₺¢]|TL\b|DH\b)")?,
            amount_code: regex(r"([0-9][0-9,.]*)\s*([A-Z]{3})\b")?,
            number: regex(r"[0-9][0-9,.]*")?,
            url_asin: regex(r"(?i)/dp/([A-Z0-9]{10})")?,
            bare_asin: regex(r"\b([A-Z0-9]{10})\b")?,
            sold_by: vec![
                regex(r"(?i)Sold by\s+([^.|,]+)")?,
                regex(r"(?i)Vendu par\s+([^.|,]+)")?,
                regex(r"(?i)Verkauf.*?durch\s+([^.|,]+)")?,
                regex(r"(?i)Satıcı[:\s]+([^.|,]+)")?,
            ],
            sold_by_label: regex(r"(?i)sold by|vendu par|verkauft|venditore|vendedor|satıcı")?,
            image_size_tokens: vec![
                regex(r"_SR\d{2,4},\d{2,4}_")?,
                regex(r"_SS\d{2,4}_")?,
                regex(r"\._AC_[A-Za-z0-9,]+_")?,
            ],
            fast_delivery: regex(
                r"prime|ücretsiz teslimat|free shipping|livraison gratuite|kostenlose lieferung|spedizione gratuita|envío gratis",
            )?,
            prime_membership: regex(r"prime membership|prime üyelik|prime members|prime member")?,
            fulfilled_by_amazon: regex(r"amazon|fulfilled.*amazon")?,
        };
        Ok(Self { sel, re })
    }

    fn price(&self, doc: &Html, host: &str) -> (String, Option<String>) {
        let text = first_text(doc, &self.sel.price);
        if text.is_empty() {
            return (String::new(), None);
        }

        let symbol_amount = [&self.re.symbol_first, &self.re.code_first]
            .into_iter()
            .find_map(|re| re.captures(&text).map(|c| (c[1].to_string(), c[2].to_string())));
        let amount_symbol = || {
            [&self.re.amount_first, &self.re.amount_code]
                .into_iter()
                .find_map(|re| re.captures(&text).map(|c| (c[2].to_string(), c[1].to_string())))
        };
        if let Some((symbol, amount)) = symbol_amount.or_else(amount_symbol) {
            return (amount, Some(currency_code(&symbol)));
        }

        let amount = self
            .re
            .number
            .find(&text)
            .map(|m| m.as_str().to_string())
            .unwrap_or(text);
        (amount, Some(currency_for_host(host).to_string()))
    }

    fn asin(&self, doc: &Html, url: &str) -> String {
        if let Some(value) = doc
            .select(&self.sel.asin_input)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return value.to_string();
        }
        if let Some(caps) = self.re.url_asin.captures(url) {
            return caps[1].to_string();
        }
        doc.select(&self.sel.detail_bullets_items)
            .map(clean_text)
            .find(|text| text.to_ascii_uppercase().contains("ASIN"))
            .and_then(|text| self.re.bare_asin.captures(&text).map(|c| c[1].to_string()))
            .unwrap_or_default()
    }

    fn images(&self, doc: &Html, base: Option<&Url>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();
        for img in doc.select(&self.sel.images) {
            let attrs = img.value();
            let Some(src) = ["data-old-hires", "data-src", "src"]
                .iter()
                .filter_map(|name| attrs.attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty())
            else {
                continue;
            };
            let mut upgraded = src.to_string();
            for token in &self.re.image_size_tokens {
                upgraded = token.replace_all(&upgraded, "").into_owned();
            }
            let absolute = match base.and_then(|b| b.join(&upgraded).ok()) {
                Some(url) => url.to_string(),
                None => upgraded,
            };
            if seen.insert(absolute.clone()) {
                images.push(absolute);
            }
        }
        images
    }

    fn in_stock(&self, doc: &Html) -> bool {
        let availability = doc
            .select(&self.sel.availability)
            .next()
            .map(clean_text)
            .unwrap_or_default()
            .to_lowercase();
        let positive = IN_STOCK_PHRASES.iter().any(|p| availability.contains(p));
        let negative = OUT_OF_STOCK_PHRASES.iter().any(|p| availability.contains(p));
        let can_add_to_cart = doc
            .select(&self.sel.add_to_cart)
            .next()
            .is_some_and(|button| button.value().attr("disabled").is_none());
        (can_add_to_cart || positive) && !negative
    }

    fn seller(&self, doc: &Html) -> String {
        if let Some(trigger) = doc.select(&self.sel.seller_trigger).next() {
            let name = clean_text(trigger);
            if !name.is_empty() {
                return name;
            }
        }

        for row in doc.select(&self.sel.buybox_rows) {
            let label = row
                .value()
                .attr("tabular-attribute-name")
                .map(str::to_string)
                .unwrap_or_else(|| clean_text(row));
            if !self.re.sold_by_label.is_match(&label) {
                continue;
            }
            if let Some(link) = row.select(&self.sel.seller_link).next() {
                let name = clean_text(link);
                if !name.is_empty() {
                    return name;
                }
            }
            let text = clean_text(row);
            let tail = text.rsplit(':').next().unwrap_or_default().trim();
            if !tail.is_empty() {
                return tail.to_string();
            }
        }

        if let Some(merchant) = doc.select(&self.sel.merchant_info).next() {
            if let Some(link) = merchant.select(&self.sel.seller_link).next() {
                let name = clean_text(link);
                if !name.is_empty() {
                    return name;
                }
            }
            let text = clean_text(merchant);
            if let Some(name) = self
                .re
                .sold_by
                .iter()
                .find_map(|re| re.captures(&text).map(|c| c[1].trim().to_string()))
            {
                return name;
            }
        }

        if doc.select(&self.sel.fulfilled_by_amazon).next().is_some() {
            return "Amazon".to_string();
        }
        String::new()
    }

    fn category(&self, doc: &Html) -> String {
        doc.select(&self.sel.breadcrumbs)
            .map(clean_text)
            .filter(|crumb| !crumb.is_empty())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn description(&self, doc: &Html) -> String {
        let bullets = doc
            .select(&self.sel.feature_bullets)
            .map(clean_text)
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        let body = doc
            .select(&self.sel.description)
            .next()
            .map(clean_text)
            .unwrap_or_default();
        [bullets, body]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn prime(&self, doc: &Html) -> bool {
        if self
            .sel
            .prime_badges
            .iter()
            .any(|sel| doc.select(sel).next().is_some())
        {
            return true;
        }

        let delivery_mentions_fast_shipping = self.sel.delivery_messages.iter().any(|sel| {
            doc.select(sel)
                .next()
                .map(|el| clean_text(el).to_lowercase())
                .is_some_and(|text| self.re.fast_delivery.is_match(&text))
        });
        if delivery_mentions_fast_shipping {
            return true;
        }

        let body = doc
            .select(&self.sel.body)
            .next()
            .map(|el| clean_text(el).to_lowercase())
            .unwrap_or_default();
        if self.re.prime_membership.is_match(&body) {
            return true;
        }

        doc.select(&self.sel.merchant_blocks).any(|block| {
            self.re
                .fulfilled_by_amazon
                .is_match(&clean_text(block).to_lowercase())
        })
    }
}

impl ProductExtractor for AmazonProductExtractor {
    fn extract(&self, page: &PageContent) -> Result<Option<ProductRecord>, ExtractError> {
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.final_url).ok();
        let host = base
            .as_ref()
            .and_then(|u| u.host_str())
            .unwrap_or_default()
            .to_string();

        let title = first_text(&doc, &self.sel.title);
        let asin = self.asin(&doc, &page.final_url);
        if title.is_empty() && asin.is_empty() {
            return Ok(None);
        }
        let (price, currency) = self.price(&doc, &host);

        Ok(Some(ProductRecord {
            asin,
            title,
            price,
            currency,
            in_stock: self.in_stock(&doc),
            seller: self.seller(&doc),
            category: self.category(&doc),
            images: self.images(&doc, base.as_ref()),
            description: self.description(&doc),
            prime: self.prime(&doc),
            url: page.final_url.clone(),
        }))
    }
}

fn currency_code(symbol: &str) -> String {
    let code = match symbol {
        "$" | "¢" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        "¥" => "JPY",
        "₹" => "INR",
        "₺" | "TL" => "TRY",
        "د.إ" | "DH" => "AED",
        "C$" => "CAD",
        "A$" => "AUD",
        other => other,
    };
    code.to_string()
}

/// Currency implied by the storefront domain when the price carries no symbol.
fn currency_for_host(host: &str) -> &'static str {
    if host.ends_with(".co.uk") {
        "GBP"
    } else if [".de", ".fr", ".it", ".es"].iter().any(|tld| host.ends_with(tld)) {
        "EUR"
    } else if host.ends_with(".com.tr") {
        "TRY"
    } else if host.ends_with(".ae") {
        "AED"
    } else if host.ends_with(".in") {
        "INR"
    } else if host.ends_with(".ca") {
        "CAD"
    } else if host.ends_with(".com.au") {
        "AUD"
    } else if host.ends_with(".co.jp") {
        "JPY"
    } else {
        "USD"
    }
}

#[cfg(test)]
mod tests {
    use super::{currency_code, currency_for_host};

    #[test]
    fn maps_symbols_to_codes() {
        assert_eq!(currency_code("€"), "EUR");
        assert_eq!(currency_code("TL"), "TRY");
        assert_eq!(currency_code("C$"), "CAD");
        assert_eq!(currency_code("CHF"), "CHF");
    }

    #[test]
    fn infers_currency_from_storefront() {
        assert_eq!(currency_for_host("www.amazon.co.uk"), "GBP");
        assert_eq!(currency_for_host("www.amazon.de"), "EUR");
        assert_eq!(currency_for_host("www.amazon.com.tr"), "TRY");
        assert_eq!(currency_for_host("www.amazon.com"), "USD");
    }
}
