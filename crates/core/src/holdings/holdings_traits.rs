use async_trait::async_trait;
use log::warn;

use lotfolio_market_data::{AssetKind, PriceGateway, PriceQuote};

/// Quote lookup seam between portfolio valuation and the market-data
/// gateway. `None` means no price could be resolved from any source; the
/// caller falls back to the asset's last transaction price.
#[async_trait]
pub trait QuoteResolverTrait: Send + Sync {
    async fn resolve_quote(
        &self,
        symbol: &str,
        asset_class: AssetKind,
        market: Option<&str>,
    ) -> Option<PriceQuote>;
}

/// The gateway already degrades provider trouble to `Ok(None)`; the only
/// errors left here are caller mistakes, which valuation treats as a
/// missing price rather than a failed request.
#[async_trait]
impl QuoteResolverTrait for PriceGateway {
    async fn resolve_quote(
        &self,
        symbol: &str,
        asset_class: AssetKind,
        market: Option<&str>,
    ) -> Option<PriceQuote> {
        match self.get_quote(symbol, market, asset_class).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!("Quote resolution failed for {}: {}", symbol, err);
                None
            }
        }
    }
}
