//! Cross-model consistency of futures option prices and sensitivities.
//!
//! For every smile model, a flat Black provider set to the model's volatility
//! at the option point must give the same price, vega and sticky-strike
//! curve sensitivity. Smile-aware sensitivities are checked against full
//! revaluation.

use approx::assert_relative_eq;
use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider, YieldCurve};
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::{Currency, IssuerId, RateIndex};
use futopt_models::volatility::{
    BlackSurfaceExpiryDelay, BlackSurfaceExpiryMoneyness, BlackSurfaceExpiryStrike, FlatVolatility,
    SabrVolatility, SsviVolatility, VolatilityModel, VolatilityModelEnum,
};
use futopt_models::ModelError;
use futopt_pricing::instruments::{
    BondFuturesSecurity, FixedCouponBond, FutureSecurity, FuturesOptionMarginSecurity,
    FuturesOptionPremiumSecurity, InterestRateFutureSecurity,
};
use futopt_pricing::options::FuturesOptionPricing;
use futopt_pricing::providers::BlackFuturesProvider;

fn euribor() -> RateIndex {
    RateIndex::new("EURIBOR3M", Currency::EUR)
}

fn curves() -> MulticurveProvider {
    let times = [0.25, 0.5, 1.0, 2.0, 5.0, 10.0];
    MulticurveProvider::new()
        .with_discount_curve(
            Currency::EUR,
            "EUR-DSC",
            InterpolatedCurve::linear(&times, &[0.0029, 0.0026, 0.0026, 0.0030, 0.0061, 0.0107]).unwrap(),
        )
        .with_forward_curve(
            euribor(),
            "EUR-FWD3M",
            InterpolatedCurve::linear(&times, &[0.0035, 0.0033, 0.0034, 0.0040, 0.0072, 0.0118]).unwrap(),
        )
        .with_issuer_curve(
            IssuerId::new("GER"),
            "EUR-GER",
            InterpolatedCurve::linear(&times, &[0.0007, 0.0009, 0.0011, 0.0018, 0.0045, 0.0089]).unwrap(),
        )
}

fn stir() -> FutureSecurity {
    InterestRateFutureSecurity::new("ERZ6", euribor(), 1.0, 1.0, 1.25, 0.25, 1_000_000.0, 0.25)
        .unwrap()
        .into()
}

fn bund() -> FutureSecurity {
    let ger = || IssuerId::new("GER");
    let basket = vec![
        FixedCouponBond::regular(ger(), Currency::EUR, 0.01, 1, 0.5, 0.9, 9).unwrap(),
        FixedCouponBond::regular(ger(), Currency::EUR, 0.005, 1, 0.5, 1.2, 10).unwrap(),
    ];
    BondFuturesSecurity::new("FGBLU6", 0.45, 0.5, basket, vec![0.72, 0.69], 100_000.0)
        .unwrap()
        .into()
}

fn models() -> Vec<VolatilityModelEnum> {
    vec![
        FlatVolatility::new(0.011).unwrap().into(),
        BlackSurfaceExpiryStrike::new(
            &[0.25, 1.0],
            &[0.97, 0.99, 1.01],
            vec![vec![0.012, 0.01, 0.011], vec![0.013, 0.011, 0.012]],
        )
        .unwrap()
        .into(),
        BlackSurfaceExpiryMoneyness::new(
            &[0.25, 1.0],
            &[-0.03, 0.0, 0.03],
            vec![vec![0.012, 0.01, 0.011], vec![0.013, 0.011, 0.012]],
        )
        .unwrap()
        .into(),
        BlackSurfaceExpiryDelay::new(&[0.25, 1.0], &[0.0, 0.5], vec![vec![0.012, 0.01], vec![0.013, 0.011]])
            .unwrap()
            .into(),
        SabrVolatility::flat(0.011, 0.5, -0.25, 0.4).unwrap().into(),
        SsviVolatility::new(&[0.0, 0.5, 1.0, 5.0], &[0.01, 0.011, 0.012, 0.01], 0.25, 0.5)
            .unwrap()
            .into(),
    ]
}

fn parallel_total(sensitivity: &MulticurveSensitivity, curves: &MulticurveProvider, name: &str) -> f64 {
    use futopt_core::market_data::CurveProvider;
    let mut total: f64 = sensitivity
        .yield_discounting()
        .get(name)
        .map(|points| points.iter().map(|(_, v)| v).sum())
        .unwrap_or(0.0);
    if let Some(forwards) = sensitivity.forward().get(name) {
        let curve = curves.curve(name).unwrap();
        for f in forwards {
            let ratio = curve.discount_factor(f.start).unwrap() / curve.discount_factor(f.end).unwrap();
            total += f.value * (f.end - f.start) * ratio / f.accrual;
        }
    }
    total
}

#[test]
fn test_flat_equivalent_reproduces_price_vega_and_curve_sensitivity() {
    for model in models() {
        let provider = BlackFuturesProvider::new(curves(), model);
        for strike in [0.985, 0.99, 0.995] {
            let option = FuturesOptionPremiumSecurity::new(stir(), 0.75, strike, true).unwrap();
            let vol = option.implied_volatility(&provider).unwrap();
            let flat = provider.with_volatility(FlatVolatility::new(vol).unwrap());
            let name = provider.volatility().name();
            assert_relative_eq!(option.price(&provider).unwrap(), option.price(&flat).unwrap(), epsilon = 1e-12);
            assert_relative_eq!(option.vega(&provider).unwrap(), option.vega(&flat).unwrap(), epsilon = 1e-10);
            let smile = option.price_curve_sensitivity(&provider).unwrap();
            let frozen = option.price_curve_sensitivity(&flat).unwrap();
            assert!(smile.max_abs_difference(&frozen) < 1e-10, "{} at {}", name, strike);
        }
    }
}

#[test]
fn test_put_call_parity_for_every_model() {
    for model in models() {
        let provider = BlackFuturesProvider::new(curves(), model);
        for strike in [0.98, 0.9925, 1.0] {
            let call = FuturesOptionMarginSecurity::new(stir(), 0.75, strike, true).unwrap();
            let put = call.with_opposite_type();
            let f = call.underlying_futures_price(&provider).unwrap();
            let parity = call.price(&provider).unwrap() - put.price(&provider).unwrap();
            assert_relative_eq!(parity, f - strike, epsilon = 1e-8);
        }
    }
}

#[test]
fn test_smile_curve_sensitivity_matches_revaluation() {
    let h = 1e-6;
    for model in models() {
        let provider = BlackFuturesProvider::new(curves(), model);
        let name = provider.volatility().name();
        let option = FuturesOptionMarginSecurity::new(stir(), 0.75, 0.99, false).unwrap();
        let sensitivity = option.price_curve_sensitivity_with_smile(&provider).unwrap();
        let up = provider.with_curves(provider.curves().with_parallel_shift("EUR-FWD3M", h).unwrap());
        let down = provider.with_curves(provider.curves().with_parallel_shift("EUR-FWD3M", -h).unwrap());
        let fd = (option.price(&up).unwrap() - option.price(&down).unwrap()) / (2.0 * h);
        let analytic = parallel_total(&sensitivity, provider.curves(), "EUR-FWD3M");
        assert!((analytic - fd).abs() < 1e-8, "{}: {} vs {}", name, analytic, fd);
    }
}

#[test]
fn test_model_parameter_sensitivity_matches_revaluation() {
    let h = 1e-6;
    for model in models() {
        let provider = BlackFuturesProvider::new(curves(), model);
        let option = FuturesOptionPremiumSecurity::new(stir(), 0.75, 0.9925, true).unwrap();
        let sensitivity = option.price_volatility_parameter_sensitivity(&provider).unwrap();
        for (parameter, _) in provider.volatility().parameters() {
            let up = provider.with_volatility(provider.volatility().with_shifted_parameter(&parameter, h).unwrap());
            let down =
                provider.with_volatility(provider.volatility().with_shifted_parameter(&parameter, -h).unwrap());
            let fd = (option.price(&up).unwrap() - option.price(&down).unwrap()) / (2.0 * h);
            assert!(
                (sensitivity.get(&parameter) - fd).abs() < 1e-8,
                "{} {}: {} vs {}",
                provider.volatility().name(),
                parameter,
                sensitivity.get(&parameter),
                fd
            );
        }
    }
}

#[test]
fn test_bond_futures_option_issuer_curve_sensitivity() {
    let provider = BlackFuturesProvider::new(curves(), SabrVolatility::flat(0.05, 0.5, -0.25, 0.4).unwrap());
    let option = FuturesOptionMarginSecurity::new(bund(), 0.4, 1.45, true).unwrap();
    let price = option.price(&provider).unwrap();
    assert!(price > 0.0);
    let sensitivity = option.price_curve_sensitivity_with_smile(&provider).unwrap();
    let h = 1e-6;
    let up = provider.with_curves(provider.curves().with_parallel_shift("EUR-GER", h).unwrap());
    let down = provider.with_curves(provider.curves().with_parallel_shift("EUR-GER", -h).unwrap());
    let fd = (option.price(&up).unwrap() - option.price(&down).unwrap()) / (2.0 * h);
    assert_relative_eq!(parallel_total(&sensitivity, provider.curves(), "EUR-GER"), fd, epsilon = 1e-6);
}

#[test]
fn test_runtime_model_matches_typed_model() {
    let typed = BlackFuturesProvider::new(curves(), SabrVolatility::flat(0.011, 0.5, -0.25, 0.4).unwrap());
    let dynamic = typed.with_volatility(VolatilityModelEnum::from(typed.volatility().clone()));
    let option = FuturesOptionMarginSecurity::new(stir(), 0.75, 0.99, true).unwrap();
    assert_eq!(option.price(&typed).unwrap(), option.price(&dynamic).unwrap());
    assert_eq!(
        option.price_volatility_parameter_sensitivity(&typed).unwrap(),
        option.price_volatility_parameter_sensitivity(&dynamic).unwrap()
    );
}

#[test]
fn test_model_specific_access_on_wrong_model() {
    let flat = VolatilityModelEnum::from(FlatVolatility::new(0.01).unwrap());
    assert!(matches!(flat.as_sabr(), Err(ModelError::ModelMismatch { expected: "SABR", .. })));
    assert!(matches!(flat.as_ssvi(), Err(ModelError::ModelMismatch { expected: "SSVI", .. })));
}

#[test]
fn test_zero_ssvi_variance_prices_at_intrinsic() {
    let ssvi = SsviVolatility::new(&[0.0, 0.5, 1.0], &[0.0, 0.0, 0.0], 0.25, 0.5).unwrap();
    let provider = BlackFuturesProvider::new(curves(), ssvi);
    for strike in [0.97, 0.99, 0.995] {
        let call = FuturesOptionMarginSecurity::new(stir(), 0.75, strike, true).unwrap();
        let f = call.underlying_futures_price(&provider).unwrap();
        assert_eq!(call.implied_volatility(&provider).unwrap(), 0.0);
        assert_relative_eq!(call.price(&provider).unwrap(), (f - strike).max(0.0), epsilon = 1e-15);
        let sensitivity = call.price_ssvi_sensitivity(&provider).unwrap();
        assert!(sensitivity.atm_volatility.iter().all(|d| d.is_finite()));
        assert!(sensitivity.rho.is_finite() && sensitivity.eta.is_finite());
    }
}

#[test]
fn test_negative_sabr_variance_prices_at_intrinsic() {
    // large negative correlation and vol of vol drive the expansion's variance below zero
    let sabr = SabrVolatility::flat(1.0, 1.0, -0.99, 5.0).unwrap();
    let provider = BlackFuturesProvider::new(curves(), sabr);
    for strike in [0.97, 0.99, 1.0] {
        for is_call in [true, false] {
            let option = FuturesOptionMarginSecurity::new(stir(), 0.75, strike, is_call).unwrap();
            let f = option.underlying_futures_price(&provider).unwrap();
            let intrinsic = if is_call { f - strike } else { strike - f }.max(0.0);
            assert_eq!(option.implied_volatility(&provider).unwrap(), 0.0);
            assert_relative_eq!(option.price(&provider).unwrap(), intrinsic, epsilon = 1e-15);
            let sensitivity = option.price_sabr_sensitivity(&provider).unwrap();
            assert_eq!(sensitivity.total(), 0.0);
        }
    }
}
