//! Price derivation from raw pool state
//!
//! Converts a pool's native encoding (sqrtPriceX96 or paired reserves)
//! plus the pair's token decimals into a human-readable f64 price.
//!
//! The sqrtPriceX96 square is taken in U512 before any float conversion:
//! `S` can exceed 2^160, so `S * S` needs up to 2^320 of exact integer
//! range. Only the final ratio is reduced to double precision.

use alloy_primitives::aliases::U512;
use alloy_primitives::U256;

use crate::{u256_to_f64, PoolModel, PriceError, TokenPairConfig};

/// Raw on-chain state for one pool, tagged by math model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Slot0 { sqrt_price_x96: U256 },
    Reserves { reserve0: U256, reserve1: U256 },
}

impl PoolState {
    pub fn model(&self) -> PoolModel {
        match self {
            PoolState::Slot0 { .. } => PoolModel::SqrtPriceX96,
            PoolState::Reserves { .. } => PoolModel::ReservePair,
        }
    }
}

/// Derive the pair's display price from raw pool state.
///
/// Pure; degenerate inputs (zero reserve, zero price slot) come back as
/// [`PriceError`], never as Inf/NaN in the price.
pub fn derive_price(state: &PoolState, pair: &TokenPairConfig) -> Result<f64, PriceError> {
    let raw_ratio = match state {
        PoolState::Slot0 { sqrt_price_x96 } => {
            if sqrt_price_x96.is_zero() {
                return Err(PriceError::Degenerate("zero sqrtPriceX96"));
            }
            let sqrt: U512 = U512::from(*sqrt_price_x96);
            let squared = sqrt * sqrt;
            let numerator: f64 = squared.to_string().parse().unwrap_or(0.0);
            numerator / 2f64.powi(192)
        }
        PoolState::Reserves { reserve0, reserve1 } => {
            if reserve0.is_zero() {
                return Err(PriceError::Degenerate("zero reserve0"));
            }
            u256_to_f64(*reserve1) / u256_to_f64(*reserve0)
        }
    };

    let adjustment = pair.token0.decimals as i32 - pair.token1.decimals as i32;
    let human_ratio = raw_ratio * 10f64.powi(adjustment);

    let price = if pair.invert {
        if human_ratio == 0.0 {
            return Err(PriceError::Degenerate("zero ratio before inversion"));
        }
        1.0 / human_ratio
    } else {
        human_ratio
    };

    if !price.is_finite() || price <= 0.0 {
        return Err(PriceError::Degenerate("non-finite or non-positive price"));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EndpointFamily, SideConvention, TokenMeta, TokenSide};
    use proptest::prelude::*;

    fn pair(decimals0: u8, decimals1: u8, invert: bool, model: PoolModel) -> TokenPairConfig {
        TokenPairConfig {
            id: "test".to_string(),
            title: "Test".to_string(),
            pool: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            model,
            token0: TokenMeta::new("T0", decimals0),
            token1: TokenMeta::new("T1", decimals1),
            base: TokenSide::Token0,
            invert,
            side_convention: SideConvention::PositiveIsSell,
            family: EndpointFamily::Mainnet,
        }
    }

    #[test]
    fn sqrt_price_of_one() {
        // sqrtPriceX96 = 2^96 encodes price 1 for equal decimals
        let state = PoolState::Slot0 {
            sqrt_price_x96: U256::from(1u8) << 96,
        };
        let price = derive_price(&state, &pair(18, 18, false, PoolModel::SqrtPriceX96)).unwrap();
        assert!((price - 1.0).abs() < 1e-9);
    }

    #[test]
    fn eth_usdc_scenario() {
        // sqrt(raw ratio) = 22360 -> raw ratio ~ 5.0e8, with (6, 18) and
        // reciprocal the display price lands near 2000 USDC/ETH
        let state = PoolState::Slot0 {
            sqrt_price_x96: U256::from(22360u64) << 96,
        };
        let price = derive_price(&state, &pair(6, 18, true, PoolModel::SqrtPriceX96)).unwrap();
        assert!((price - 2000.0).abs() < 1.0, "price was {price}");
    }

    #[test]
    fn huge_sqrt_price_stays_finite() {
        // S beyond 2^160: the square must not overflow before reaching f64
        let state = PoolState::Slot0 {
            sqrt_price_x96: U256::from(1u8) << 200,
        };
        let price = derive_price(&state, &pair(18, 18, false, PoolModel::SqrtPriceX96)).unwrap();
        assert!(price.is_finite() && price > 0.0);
    }

    #[test]
    fn reserve_pair_price() {
        // 2_000_000 VOW-like (18d) vs 50_000 USDT-like (6d):
        // raw = r1/r0, adjusted by 10^(18-6)
        let state = PoolState::Reserves {
            reserve0: U256::from(2_000_000u64) * U256::from(10u64).pow(U256::from(18u64)),
            reserve1: U256::from(50_000u64) * U256::from(10u64).pow(U256::from(6u64)),
        };
        let price = derive_price(&state, &pair(18, 6, false, PoolModel::ReservePair)).unwrap();
        assert!((price - 0.025).abs() < 1e-9, "price was {price}");
    }

    #[test]
    fn zero_inputs_are_degenerate() {
        let zero_reserve = PoolState::Reserves {
            reserve0: U256::ZERO,
            reserve1: U256::from(1u8),
        };
        assert!(derive_price(&zero_reserve, &pair(18, 6, false, PoolModel::ReservePair)).is_err());

        let zero_slot = PoolState::Slot0 {
            sqrt_price_x96: U256::ZERO,
        };
        assert!(derive_price(&zero_slot, &pair(6, 18, true, PoolModel::SqrtPriceX96)).is_err());
    }

    proptest! {
        #[test]
        fn sqrt_price_is_finite_positive(raw in 1u128..=u128::MAX) {
            let state = PoolState::Slot0 { sqrt_price_x96: U256::from(raw) };
            let price = derive_price(&state, &pair(6, 18, false, PoolModel::SqrtPriceX96));
            prop_assert!(price.map(|p| p.is_finite() && p > 0.0).unwrap_or(false));
        }

        #[test]
        fn invert_is_reciprocal(raw in 1u128..=u128::MAX, d0 in 0u8..=18, d1 in 0u8..=18) {
            let state = PoolState::Slot0 { sqrt_price_x96: U256::from(raw) };
            let direct = derive_price(&state, &pair(d0, d1, false, PoolModel::SqrtPriceX96)).unwrap();
            let inverted = derive_price(&state, &pair(d0, d1, true, PoolModel::SqrtPriceX96)).unwrap();
            let product = direct * inverted;
            prop_assert!((product - 1.0).abs() < 1e-9, "product was {}", product);
        }

        #[test]
        fn reserve_ratio_is_scale_invariant(
            r0 in 1u64..=u64::MAX,
            r1 in 1u64..=u64::MAX,
            k in 1u64..=1_000_000,
        ) {
            let base = PoolState::Reserves {
                reserve0: U256::from(r0),
                reserve1: U256::from(r1),
            };
            let scaled = PoolState::Reserves {
                reserve0: U256::from(r0) * U256::from(k),
                reserve1: U256::from(r1) * U256::from(k),
            };
            let cfg = pair(18, 6, false, PoolModel::ReservePair);
            let a = derive_price(&base, &cfg).unwrap();
            let b = derive_price(&scaled, &cfg).unwrap();
            prop_assert!(((a - b) / a).abs() < 1e-9);
        }
    }
}
