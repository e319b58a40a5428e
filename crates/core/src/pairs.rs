//! Trading pair configuration
//!
//! Each supported pair is one [`TokenPairConfig`]: pool address, token
//! decimals, pool math model, and the display/side conventions. All of it
//! is data handed to the session controller at startup; there are no
//! per-pair code paths.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool math model deciding how raw state maps to a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolModel {
    /// Concentrated-liquidity pool exposing `slot0().sqrtPriceX96`.
    SqrtPriceX96,
    /// Constant-product pool exposing `getReserves()`.
    ReservePair,
}

/// Which pool token a config field refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSide {
    Token0,
    Token1,
}

/// Side assigned to a positive base-token amount in a swap event.
///
/// The mapping differs per pool depending on its token ordering, so it is
/// configuration to be verified against the pool, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SideConvention {
    PositiveIsBuy,
    PositiveIsSell,
}

impl SideConvention {
    pub fn positive_side(&self) -> crate::Side {
        match self {
            SideConvention::PositiveIsBuy => crate::Side::Buy,
            SideConvention::PositiveIsSell => crate::Side::Sell,
        }
    }
}

/// Node-provider family a pair's pool lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointFamily {
    Mainnet,
    WorldChain,
}

impl fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointFamily::Mainnet => write!(f, "mainnet"),
            EndpointFamily::WorldChain => write!(f, "worldchain"),
        }
    }
}

/// Token symbol and decimal precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMeta {
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// Static descriptor for one supported trading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairConfig {
    /// Stable identifier used in routes and logs, e.g. "eth-usdc".
    pub id: String,
    /// Display title for the kiosk page.
    pub title: String,
    pub pool: Address,
    pub model: PoolModel,
    pub token0: TokenMeta,
    pub token1: TokenMeta,
    /// Which pool token is the displayed base asset.
    pub base: TokenSide,
    /// Quote the reciprocal of the pool's native token1/token0 ratio.
    pub invert: bool,
    pub side_convention: SideConvention,
    pub family: EndpointFamily,
}

impl TokenPairConfig {
    pub fn base_meta(&self) -> &TokenMeta {
        match self.base {
            TokenSide::Token0 => &self.token0,
            TokenSide::Token1 => &self.token1,
        }
    }

    pub fn quote_meta(&self) -> &TokenMeta {
        match self.base {
            TokenSide::Token0 => &self.token1,
            TokenSide::Token1 => &self.token0,
        }
    }
}

/// The pairs the kiosk ships with.
pub fn builtin_pairs() -> Vec<TokenPairConfig> {
    vec![
        // Uniswap V3 USDC/WETH 0.05%
        TokenPairConfig {
            id: "eth-usdc".to_string(),
            title: "Ethereum".to_string(),
            pool: "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640".parse().unwrap(),
            model: PoolModel::SqrtPriceX96,
            token0: TokenMeta::new("USDC", 6),
            token1: TokenMeta::new("WETH", 18),
            base: TokenSide::Token1,
            invert: true,
            side_convention: SideConvention::PositiveIsSell,
            family: EndpointFamily::Mainnet,
        },
        // Uniswap V3 WBTC/USDT
        TokenPairConfig {
            id: "wbtc-usdt".to_string(),
            title: "Bitcoin".to_string(),
            pool: "0x9Db9e0e53058C89e5B94e29621a205198648425B".parse().unwrap(),
            model: PoolModel::SqrtPriceX96,
            token0: TokenMeta::new("WBTC", 8),
            token1: TokenMeta::new("USDT", 6),
            base: TokenSide::Token0,
            invert: false,
            side_convention: SideConvention::PositiveIsBuy,
            family: EndpointFamily::Mainnet,
        },
        // Uniswap V3 WLD/USDC on World Chain
        TokenPairConfig {
            id: "wld-usdc".to_string(),
            title: "Worldcoin".to_string(),
            pool: "0x610E319b3A3Ab56A0eD5562927D37c233774ba39".parse().unwrap(),
            model: PoolModel::SqrtPriceX96,
            token0: TokenMeta::new("WLD", 18),
            token1: TokenMeta::new("USDC", 6),
            base: TokenSide::Token0,
            invert: false,
            side_convention: SideConvention::PositiveIsSell,
            family: EndpointFamily::WorldChain,
        },
        // Uniswap V2 style VOW/USDT
        TokenPairConfig {
            id: "vow-usdt".to_string(),
            title: "VOW".to_string(),
            pool: "0x1e49768714E438E789047f48FD386686a5707db2".parse().unwrap(),
            model: PoolModel::ReservePair,
            token0: TokenMeta::new("VOW", 18),
            token1: TokenMeta::new("USDT", 6),
            base: TokenSide::Token0,
            invert: false,
            side_convention: SideConvention::PositiveIsSell,
            family: EndpointFamily::Mainnet,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pairs_are_well_formed() {
        let pairs = builtin_pairs();
        assert_eq!(pairs.len(), 4);

        for pair in &pairs {
            assert!(!pair.id.is_empty());
            assert_ne!(pair.base_meta().symbol, pair.quote_meta().symbol);
        }

        let eth = pairs.iter().find(|p| p.id == "eth-usdc").unwrap();
        assert_eq!(eth.token0.decimals, 6);
        assert_eq!(eth.token1.decimals, 18);
        assert!(eth.invert);
        assert_eq!(eth.base, TokenSide::Token1);

        let vow = pairs.iter().find(|p| p.id == "vow-usdt").unwrap();
        assert_eq!(vow.model, PoolModel::ReservePair);
        assert!(!vow.invert);
    }
}
