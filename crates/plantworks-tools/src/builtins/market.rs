//! Marketplace: listings, price comparison and seller verification

use super::{required_str, str_arg};
use crate::contract::{CapabilityKind, ParamKind, ParamRule, ParamSpec, ToolContract};
use crate::error::{Error, Result};
use crate::registry::Tool;
use serde_json::{json, Value};

const AFFILIATE_TAG: &str = "ref=plantworks";

struct Offer {
    seller: &'static str,
    price: f64,
    size: &'static str,
    availability: &'static str,
    url: &'static str,
    shipping_cost: f64,
    shipping_free_over: f64,
    rating: f64,
    reviews: u32,
}

impl Offer {
    fn affiliate_url(&self) -> String {
        format!("{}?{}", self.url, AFFILIATE_TAG)
    }

    /// Shipping charged on this offer alone
    fn shipping_penalty(&self) -> f64 {
        if self.price >= self.shipping_free_over {
            0.0
        } else {
            self.shipping_cost
        }
    }

    fn value_score(&self) -> f64 {
        self.rating * 20.0 - self.price - self.shipping_penalty() * 0.5
    }

    fn to_json(&self) -> Value {
        json!({
            "seller": self.seller,
            "price": self.price,
            "size": self.size,
            "availability": self.availability,
            "url": self.url,
            "affiliate_url": self.affiliate_url(),
            "shipping_cost": self.shipping_cost,
            "shipping_free_over": self.shipping_free_over,
            "rating": self.rating,
            "reviews": self.reviews,
        })
    }
}

// (names matched against the request, offers)
const LISTINGS: &[(&[&str], &[Offer])] = &[
    (
        &["monstera", "monstera deliciosa", "swiss cheese plant"],
        &[
            Offer {
                seller: "The Sill",
                price: 35.0,
                size: "4-inch pot",
                availability: "In Stock",
                url: "https://www.thesill.com/products/monstera-deliciosa",
                shipping_cost: 15.0,
                shipping_free_over: 50.0,
                rating: 4.8,
                reviews: 1250,
            },
            Offer {
                seller: "Bloomscape",
                price: 45.0,
                size: "6-inch pot",
                availability: "In Stock",
                url: "https://bloomscape.com/product/monstera-deliciosa/",
                shipping_cost: 20.0,
                shipping_free_over: 65.0,
                rating: 4.7,
                reviews: 890,
            },
            Offer {
                seller: "Planterina",
                price: 28.0,
                size: "4-inch pot",
                availability: "Limited Stock",
                url: "https://planterina.com/products/monstera-deliciosa",
                shipping_cost: 12.0,
                shipping_free_over: 40.0,
                rating: 4.6,
                reviews: 567,
            },
        ],
    ),
    (
        &["snake plant", "sansevieria", "dracaena trifasciata"],
        &[
            Offer {
                seller: "The Sill",
                price: 28.0,
                size: "4-inch pot",
                availability: "In Stock",
                url: "https://www.thesill.com/products/snake-plant",
                shipping_cost: 15.0,
                shipping_free_over: 50.0,
                rating: 4.9,
                reviews: 2100,
            },
            Offer {
                seller: "Planterina",
                price: 22.0,
                size: "4-inch pot",
                availability: "In Stock",
                url: "https://planterina.com/products/snake-plant",
                shipping_cost: 12.0,
                shipping_free_over: 40.0,
                rating: 4.8,
                reviews: 890,
            },
        ],
    ),
    (
        &["fiddle leaf fig", "ficus lyrata"],
        &[
            Offer {
                seller: "The Sill",
                price: 65.0,
                size: "6-inch pot",
                availability: "In Stock",
                url: "https://www.thesill.com/products/fiddle-leaf-fig",
                shipping_cost: 25.0,
                shipping_free_over: 75.0,
                rating: 4.5,
                reviews: 756,
            },
            Offer {
                seller: "Bloomscape",
                price: 75.0,
                size: "8-inch pot",
                availability: "In Stock",
                url: "https://bloomscape.com/product/fiddle-leaf-fig/",
                shipping_cost: 30.0,
                shipping_free_over: 85.0,
                rating: 4.4,
                reviews: 432,
            },
        ],
    ),
];

/// Offers for a plant: exact name first, then substring either way
fn offers_for(plant_name: &str) -> &'static [Offer] {
    let key = plant_name.trim().to_lowercase();
    LISTINGS
        .iter()
        .find(|(names, _)| names.contains(&key.as_str()))
        .or_else(|| {
            LISTINGS
                .iter()
                .find(|(names, _)| names.iter().any(|n| key.contains(n) || n.contains(key.as_str())))
        })
        .map(|(_, offers)| *offers)
        .unwrap_or(&[])
}

fn plant_param() -> ParamSpec {
    ParamSpec::required("plant_name", ParamKind::String, "Plant to look up").with_rule(ParamRule::NonEmpty)
}

/// Listings across partner retailers
pub struct MarketplaceSearchTool {
    contract: ToolContract,
}

impl MarketplaceSearchTool {
    /// Create the search tool
    #[must_use]
    pub fn new() -> Self {
        let contract = ToolContract::new(
            "marketplace_search",
            "Find retail listings for a plant, with affiliate links.",
            CapabilityKind::Mock,
        )
        .with_param(plant_param())
        .with_param(ParamSpec::optional("location", ParamKind::String, "Buyer location"))
        .with_param(
            ParamSpec::optional("max_price", ParamKind::Number, "Upper price bound in USD")
                .with_rule(ParamRule::Range { min: 0.0, max: 10_000.0 }),
        )
        .with_output_keys(&["plant_name", "products", "total_found"]);
        Self { contract }
    }
}

impl Default for MarketplaceSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for MarketplaceSearchTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let plant_name = required_str(&args, "plant_name")?;
        let max_price = args.get("max_price").and_then(Value::as_f64);

        let products: Vec<Value> = offers_for(plant_name)
            .iter()
            .filter(|o| max_price.map_or(true, |max| o.price <= max))
            .map(Offer::to_json)
            .collect();

        Ok(json!({
            "plant_name": plant_name,
            "location": str_arg(&args, "location"),
            "max_price": max_price,
            "total_found": products.len(),
            "products": products,
            "sources": ["The Sill", "Bloomscape", "Planterina"],
        }))
    }
}

/// Price spread and best-value pick
pub struct PriceComparatorTool {
    contract: ToolContract,
}

impl PriceComparatorTool {
    /// Create the comparator
    #[must_use]
    pub fn new() -> Self {
        let contract = ToolContract::new(
            "price_comparator",
            "Compare prices for a plant across sellers and pick the best value.",
            CapabilityKind::Mock,
        )
        .with_param(plant_param())
        .with_param(ParamSpec::optional("size", ParamKind::String, "Preferred pot size"))
        .with_output_keys(&["plant_name", "price_analysis", "best_value"]);
        Self { contract }
    }
}

impl Default for PriceComparatorTool {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait::async_trait]
impl Tool for PriceComparatorTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let plant_name = required_str(&args, "plant_name")?;
        let all = offers_for(plant_name);
        if all.is_empty() {
            return Err(Error::Execution(format!("no price data found for {}", plant_name)));
        }

        // A size filter that matches nothing is ignored
        let mut offers: Vec<&Offer> = all.iter().collect();
        if let Some(size) = str_arg(&args, "size").map(str::to_lowercase) {
            let sized: Vec<&Offer> = all.iter().filter(|o| o.size.to_lowercase().contains(&size)).collect();
            if !sized.is_empty() {
                offers = sized;
            }
        }

        let prices: Vec<f64> = offers.iter().map(|o| o.price).collect();
        let lowest = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = round2(prices.iter().sum::<f64>() / prices.len() as f64);
        let spread = highest - lowest;

        let best = offers
            .iter()
            .copied()
            .max_by(|a, b| a.value_score().total_cmp(&b.value_score()))
            .ok_or_else(|| Error::Execution("no offers to compare".to_string()))?;

        let mut recommendations = Vec::new();
        if spread > 10.0 {
            recommendations.push(format!("Significant price variation found (${:.2} spread)", spread));
        }
        if let Some(partner) = offers.iter().find(|o| o.seller.to_lowercase().contains("sill")) {
            recommendations.push(format!("The Sill (our partner) offers this plant for ${:.2}", partner.price));
        }

        Ok(json!({
            "plant_name": plant_name,
            "size_filter": str_arg(&args, "size"),
            "price_analysis": {
                "lowest_price": lowest,
                "highest_price": highest,
                "average_price": average,
                "price_spread": spread,
            },
            "best_value": {
                "seller": best.seller,
                "price": best.price,
                "rating": best.rating,
                "value_score": round2(best.value_score()),
                "affiliate_url": best.affiliate_url(),
            },
            "recommendations": recommendations,
        }))
    }
}

struct SellerRecord {
    name: &'static str,
    status: &'static str,
    trust_score: f64,
    years_in_business: u32,
    bbb_rating: &'static str,
    total_reviews: u32,
    positive_percentage: u32,
    return_policy: &'static str,
    shipping_guarantee: &'static str,
    certifications: &'static [&'static str],
}

const SELLERS: &[SellerRecord] = &[
    SellerRecord {
        name: "the sill",
        status: "Verified Business",
        trust_score: 4.5,
        years_in_business: 8,
        bbb_rating: "A+",
        total_reviews: 15_000,
        positive_percentage: 87,
        return_policy: "30-day guarantee",
        shipping_guarantee: "Safe arrival guaranteed",
        certifications: &["Certified Plant Retailer", "Sustainable Business"],
    },
    SellerRecord {
        name: "bloomscape",
        status: "Verified Business",
        trust_score: 4.3,
        years_in_business: 6,
        bbb_rating: "A",
        total_reviews: 8_500,
        positive_percentage: 82,
        return_policy: "30-day guarantee",
        shipping_guarantee: "Safe arrival guaranteed",
        certifications: &["Certified Plant Retailer"],
    },
    SellerRecord {
        name: "planterina",
        status: "Verified Business",
        trust_score: 4.6,
        years_in_business: 4,
        bbb_rating: "A",
        total_reviews: 3_200,
        positive_percentage: 89,
        return_policy: "14-day return",
        shipping_guarantee: "Safe arrival guaranteed",
        certifications: &["Certified Plant Retailer"],
    },
    SellerRecord {
        name: "local garden center",
        status: "Local Business",
        trust_score: 4.7,
        years_in_business: 25,
        bbb_rating: "A+",
        total_reviews: 450,
        positive_percentage: 94,
        return_policy: "14-day return",
        shipping_guarantee: "N/A - Local pickup",
        certifications: &["Master Gardener Certified"],
    },
];

/// Seller reputation lookup
pub struct SellerVerifierTool {
    contract: ToolContract,
}

impl SellerVerifierTool {
    /// Create the verifier
    #[must_use]
    pub fn new() -> Self {
        let contract = ToolContract::new(
            "seller_verifier",
            "Check a seller's reputation, policies and trust score.",
            CapabilityKind::Mock,
        )
        .with_param(
            ParamSpec::required("seller_name", ParamKind::String, "Seller to verify")
                .with_rule(ParamRule::NonEmpty),
        )
        .with_param(ParamSpec::optional("platform", ParamKind::String, "Where the seller trades"))
        .with_output_keys(&["seller_name", "verification_status", "trust_score"]);
        Self { contract }
    }
}

impl Default for SellerVerifierTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for SellerVerifierTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Value) -> Result<Value> {
        let seller_name = required_str(&args, "seller_name")?;
        let key = seller_name.to_lowercase();
        let platform = str_arg(&args, "platform");

        let Some(record) = SELLERS.iter().find(|s| s.name == key) else {
            return Ok(json!({
                "seller_name": seller_name,
                "platform": platform,
                "verification_status": "Unknown - Requires Manual Verification",
                "trust_score": 0.0,
                "red_flags": ["Seller not in verified database"],
                "recommendations": [
                    "Research seller independently before purchasing",
                    "Check for customer reviews on multiple platforms",
                    "Verify return and shipping policies",
                    "Start with a small order to test service quality",
                    "Look for business registration and contact information",
                ],
            }));
        };

        let mut recommendations = Vec::new();
        if record.trust_score >= 4.0 {
            recommendations.push("Highly rated seller with good customer satisfaction");
        }
        if record.years_in_business >= 5 {
            recommendations.push("Established business with proven track record");
        }
        if record.shipping_guarantee.to_lowercase().contains("guarantee") {
            recommendations.push("Offers shipping protection for live plants");
        }
        if record.positive_percentage >= 85 {
            recommendations.push("Strong positive review percentage");
        }

        Ok(json!({
            "seller_name": seller_name,
            "platform": platform,
            "verification_status": record.status,
            "trust_score": record.trust_score,
            "credentials": {
                "years_in_business": record.years_in_business,
                "bbb_rating": record.bbb_rating,
                "certifications": record.certifications,
            },
            "customer_feedback": {
                "total_reviews": record.total_reviews,
                "positive_percentage": record.positive_percentage,
                "average_rating": record.trust_score,
            },
            "policies": {
                "return_policy": record.return_policy,
                "shipping_guarantee": record.shipping_guarantee,
            },
            "red_flags": [],
            "recommendations": recommendations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_lookup_and_aliases() {
        assert_eq!(offers_for("Monstera").len(), 3);
        assert_eq!(offers_for("Sansevieria").len(), 2);
        assert_eq!(offers_for("my fiddle leaf fig").len(), 2);
        assert!(offers_for("triffid").is_empty());
    }

    #[tokio::test]
    async fn test_marketplace_search_filters_price() {
        let tool = MarketplaceSearchTool::new();
        let payload = tool
            .call(json!({"plant_name": "monstera", "max_price": 40.0}))
            .await
            .unwrap();

        assert_eq!(payload["total_found"], 2);
        let first = &payload["products"][0];
        assert_eq!(first["seller"], "The Sill");
        assert_eq!(
            first["affiliate_url"],
            "https://www.thesill.com/products/monstera-deliciosa?ref=plantworks"
        );
        assert!(tool.contract().missing_output_keys(&payload).is_empty());
    }

    #[tokio::test]
    async fn test_price_comparator_best_value() {
        let tool = PriceComparatorTool::new();
        let payload = tool.call(json!({"plant_name": "monstera"})).await.unwrap();

        // The Sill: 96 - 35 - 7.5; Bloomscape: 94 - 45 - 10; Planterina: 92 - 28 - 6
        assert_eq!(payload["best_value"]["seller"], "Planterina");
        assert_eq!(payload["best_value"]["value_score"], 58.0);
        assert_eq!(payload["price_analysis"]["lowest_price"], 28.0);
        assert_eq!(payload["price_analysis"]["highest_price"], 45.0);
        assert_eq!(payload["price_analysis"]["average_price"], 36.0);
        assert_eq!(payload["price_analysis"]["price_spread"], 17.0);
    }

    #[tokio::test]
    async fn test_price_comparator_without_data() {
        let tool = PriceComparatorTool::new();
        let err = tool.call(json!({"plant_name": "triffid"})).await.unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[tokio::test]
    async fn test_seller_verifier() {
        let tool = SellerVerifierTool::new();

        let known = tool.call(json!({"seller_name": "The Sill"})).await.unwrap();
        assert_eq!(known["verification_status"], "Verified Business");
        assert_eq!(known["trust_score"], 4.5);
        assert_eq!(known["recommendations"].as_array().unwrap().len(), 4);

        let unknown = tool.call(json!({"seller_name": "Shady Ferns Ltd"})).await.unwrap();
        assert_eq!(unknown["trust_score"], 0.0);
        assert_eq!(unknown["red_flags"][0], "Seller not in verified database");
    }
}
