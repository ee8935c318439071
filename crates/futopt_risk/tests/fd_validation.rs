//! Analytic sensitivities against bump-and-revalue, node by node.

use futopt_core::market_data::{CurveJacobian, CurveProvider, InterpolatedCurve, MulticurveProvider};
use futopt_core::sensitivity::{CurveParameterSensitivity, ModelParameter, MulticurveSensitivity};
use futopt_core::types::{Currency, IssuerId, PricingError, RateIndex};
use futopt_models::rates::HullWhiteOneFactorParameters;
use futopt_models::volatility::{
    FlatVolatility, NormalSurfaceExpirySimpleMoneyness, SabrVolatility, SsviVolatility, VolatilityModel,
};
use futopt_pricing::futures::{FuturesPricing, HullWhiteProvider};
use futopt_pricing::instruments::{
    BondFuturesSecurity, FederalFundsFutureSecurity, FixedCouponBond, FixedIborSwap, FutureSecurity,
    FuturesOptionMarginSecurity, FuturesOptionMarginTransaction, FuturesOptionPremiumSecurity,
    FuturesOptionPremiumTransaction,
    InterestRateFutureSecurity, Payment, SwapFuturesDeliverableSecurity, YieldAverageBondFuturesSecurity,
};
use futopt_pricing::options::FuturesOptionPricing;
use futopt_pricing::providers::BlackFuturesProvider;
use futopt_risk::{
    compare_curve_sensitivities, compare_parameter_sensitivities, CurveParameterSensitivityCalculator,
    FiniteDifferenceCurveCalculator, FiniteDifferenceHullWhiteCalculator, FiniteDifferenceModelCalculator,
    MarketQuoteSensitivityCalculator, Pv01Calculator, SensitivityConfig, SensitivityTolerance, BASIS_POINT,
};

const DSC: &str = "USD-DSC";
const FWD: &str = "USD-FWD3M";
const GOVT: &str = "UST";

fn libor() -> RateIndex {
    RateIndex::new("USD-LIBOR-3M", Currency::USD)
}

fn fed_funds() -> RateIndex {
    RateIndex::new("USD-FEDFUND", Currency::USD)
}

fn curves() -> MulticurveProvider {
    let times = [0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0];
    let dsc = InterpolatedCurve::linear(&times, &[0.001, 0.0015, 0.0025, 0.005, 0.012, 0.02, 0.027]).unwrap();
    let fwd = InterpolatedCurve::linear(&times, &[0.002, 0.0025, 0.0035, 0.0065, 0.014, 0.022, 0.029]).unwrap();
    let govt = InterpolatedCurve::linear(&times, &[0.0012, 0.0018, 0.003, 0.006, 0.013, 0.021, 0.028]).unwrap();
    MulticurveProvider::new()
        .with_discount_curve(Currency::USD, DSC, dsc.clone())
        .with_forward_curve(fed_funds(), DSC, dsc)
        .with_forward_curve(libor(), FWD, fwd)
        .with_issuer_curve(IssuerId::new("UST"), GOVT, govt)
}

fn config() -> SensitivityConfig {
    let config = SensitivityConfig::from_toml_str(
        r#"
        shift = 1e-6
        scheme = "central"
        absolute_tolerance = 1e-6
        relative_tolerance = 1e-4

        [parallel]
        batch_size = 4
        parallel_threshold = 4
        "#,
    )
    .unwrap();
    config.init_tracing();
    config
}

fn bucketed(point: &MulticurveSensitivity, curves: &MulticurveProvider) -> CurveParameterSensitivity {
    CurveParameterSensitivityCalculator::new()
        .calculate(point, curves)
        .unwrap()
}

fn stir() -> InterestRateFutureSecurity {
    InterestRateFutureSecurity::new("EDZ6", libor(), 1.0, 1.0, 1.25, 0.25, 1_000_000.0, 0.25).unwrap()
}

fn futures() -> Vec<FutureSecurity> {
    let ust = || IssuerId::new("UST");
    let day = 1.0 / 360.0;
    let times: Vec<f64> = (0..=21).map(|i| 0.05 + f64::from(i) * day).collect();
    let fed = FederalFundsFutureSecurity::new(
        "FFN6",
        fed_funds(),
        0.11,
        times,
        vec![day; 21],
        10.0 * day * 0.001,
        31.0 * day,
        5_000_000.0,
        1.0 / 12.0,
    )
    .unwrap();
    let bond_basket = vec![
        FixedCouponBond::regular(ust(), Currency::USD, 0.02, 2, 0.5, 0.75, 10).unwrap(),
        FixedCouponBond::regular(ust(), Currency::USD, 0.025, 2, 0.5, 0.6, 12).unwrap(),
    ];
    let bond = BondFuturesSecurity::new("TYU6", 0.45, 0.5, bond_basket, vec![0.93, 0.95], 100_000.0).unwrap();
    let ya_basket = vec![
        FixedCouponBond::regular(ust(), Currency::USD, 0.0275, 2, 0.25, 0.5, 6).unwrap(),
        FixedCouponBond::regular(ust(), Currency::USD, 0.0325, 2, 0.25, 0.4, 7).unwrap(),
    ];
    let ya = YieldAverageBondFuturesSecurity::new("YTCU6", 0.24, 0.25, ya_basket, 0.06, 3, 2, 100_000.0).unwrap();
    vec![stir().into(), fed.into(), bond.into(), ya.into(), swap_future().into()]
}

fn swap_future() -> SwapFuturesDeliverableSecurity {
    let swap = FixedIborSwap::regular(Currency::USD, libor(), 0.0175, 1.0, 10, 2, 4).unwrap();
    SwapFuturesDeliverableSecurity::new("CTPZ6", 0.98, 1.0, swap, 100_000.0).unwrap()
}

#[test]
fn test_futures_price_curve_sensitivity_per_node() {
    let config = config();
    let curves = curves();
    let fd = FiniteDifferenceCurveCalculator::from_config(&config).unwrap();
    for future in futures() {
        let analytic = bucketed(&future.futures_price_curve_sensitivity(&curves).unwrap(), &curves);
        let numerical = fd.calculate(&curves, |c: &MulticurveProvider| future.futures_price(c)).unwrap();
        let report = compare_curve_sensitivities(&analytic, &numerical, &config.tolerance()).unwrap();
        assert!(report.passed(), "{:?}: {}", future, report);
        assert_eq!(report.checked, 21);
    }
}

#[test]
fn test_option_smile_sensitivities_per_node_and_parameter() {
    let config = config();
    let ssvi = SsviVolatility::new(&[0.0, 0.5, 1.0, 5.0], &[0.01, 0.011, 0.012, 0.01], 0.25, 0.5).unwrap();
    let provider = BlackFuturesProvider::new(curves(), ssvi);
    let option = FuturesOptionPremiumSecurity::new(stir(), 0.75, 0.99, false).unwrap();

    let analytic = bucketed(&option.price_curve_sensitivity_with_smile(&provider).unwrap(), provider.curves());
    let numerical = FiniteDifferenceCurveCalculator::from_config(&config)
        .unwrap()
        .calculate(&provider, |p| option.price(p))
        .unwrap();
    let report = compare_curve_sensitivities(&analytic, &numerical, &config.tolerance()).unwrap();
    assert!(report.passed(), "{}", report);

    let analytic = option.price_volatility_parameter_sensitivity(&provider).unwrap();
    let numerical = FiniteDifferenceModelCalculator::from_config(&config)
        .unwrap()
        .calculate(&provider, |p| option.price(p))
        .unwrap();
    let report = compare_parameter_sensitivities(&analytic, &numerical, &config.tolerance());
    assert!(report.passed(), "{}", report);
    assert_eq!(report.checked, provider.volatility().parameters().len());
}

#[test]
fn test_sabr_surface_parameters() {
    let config = config();
    let sabr = SabrVolatility::new(
        &[0.25, 1.0],
        &[0.0, 0.5],
        vec![vec![0.010, 0.011], vec![0.012, 0.013]],
        vec![vec![0.5, 0.5], vec![0.5, 0.5]],
        vec![vec![-0.2, -0.25], vec![-0.3, -0.35]],
        vec![vec![0.4, 0.45], vec![0.5, 0.55]],
    )
    .unwrap();
    let provider = BlackFuturesProvider::new(curves(), sabr);
    let option = FuturesOptionMarginSecurity::new(stir(), 0.75, 0.9925, true).unwrap();

    let analytic = option.price_volatility_parameter_sensitivity(&provider).unwrap();
    let numerical = FiniteDifferenceModelCalculator::from_config(&config)
        .unwrap()
        .calculate(&provider, |p| option.price(p))
        .unwrap();
    let report = compare_parameter_sensitivities(&analytic, &numerical, &config.tolerance());
    assert!(report.passed(), "{}", report);
    assert_eq!(report.checked, 16);
}

#[test]
fn test_hull_white_swap_future() {
    let config = config();
    let parameters = HullWhiteOneFactorParameters::new(0.01, vec![0.008, 0.009, 0.01], vec![0.5, 2.0]).unwrap();
    let hw = HullWhiteProvider::new(curves(), parameters, Currency::USD);
    let future = swap_future();

    let analytic = future.futures_price_hull_white_sensitivity(&hw).unwrap();
    let numerical = FiniteDifferenceHullWhiteCalculator::from_config(&config)
        .unwrap()
        .calculate(&hw, |p| future.futures_price_hull_white(p))
        .unwrap();
    let report = compare_parameter_sensitivities(&analytic, &numerical, &config.tolerance());
    assert!(report.passed(), "{}", report);
    // margining stops before the last volatility period starts
    assert_eq!(numerical.get(&ModelParameter::HullWhiteVolatility { index: 2 }), 0.0);

    let analytic = bucketed(&future.futures_price_hull_white_curve_sensitivity(&hw).unwrap(), hw.curves());
    let numerical = FiniteDifferenceCurveCalculator::from_config(&config)
        .unwrap()
        .calculate(&hw, |p| future.futures_price_hull_white(p))
        .unwrap();
    let report = compare_curve_sensitivities(&analytic, &numerical, &config.tolerance()).unwrap();
    assert!(report.passed(), "{}", report);
}

#[test]
fn test_premium_transaction_present_value() {
    let config = config();
    let provider = BlackFuturesProvider::new(curves(), FlatVolatility::new(0.012).unwrap());
    let option = FuturesOptionPremiumSecurity::new(stir(), 0.75, 0.995, true).unwrap();
    let premium = Payment::new(Currency::USD, 0.01, -25_000.0);
    let transaction = FuturesOptionPremiumTransaction::new(option, 40, premium).unwrap();

    let analytic = bucketed(&transaction.present_value_curve_sensitivity(&provider).unwrap(), provider.curves());
    let numerical = FiniteDifferenceCurveCalculator::from_config(&config)
        .unwrap()
        .calculate(&provider, |p| transaction.present_value(p))
        .unwrap();
    let tolerance = SensitivityTolerance::new(1e-1, 1e-5).unwrap();
    let report = compare_curve_sensitivities(&analytic, &numerical, &tolerance).unwrap();
    assert!(report.passed(), "{}", report);
}

fn normal_surface(moneyness_on_price: bool) -> NormalSurfaceExpirySimpleMoneyness {
    NormalSurfaceExpirySimpleMoneyness::new(
        &[0.1, 0.5, 1.0],
        &[-0.005, 0.0, 0.005],
        vec![
            vec![0.0095, 0.0080, 0.0090],
            vec![0.0090, 0.0075, 0.0085],
            vec![0.0085, 0.0072, 0.0080],
        ],
        moneyness_on_price,
    )
    .unwrap()
}

#[test]
fn test_normal_surface_sensitivities_per_node_and_parameter() {
    let config = config();
    for moneyness_on_price in [false, true] {
        let provider = BlackFuturesProvider::new(curves(), normal_surface(moneyness_on_price));
        let option = FuturesOptionPremiumSecurity::new(stir(), 0.75, 0.9925, true).unwrap();

        let analytic = bucketed(&option.price_curve_sensitivity_with_smile(&provider).unwrap(), provider.curves());
        let numerical = FiniteDifferenceCurveCalculator::from_config(&config)
            .unwrap()
            .calculate(&provider, |p| option.price(p))
            .unwrap();
        let report = compare_curve_sensitivities(&analytic, &numerical, &config.tolerance()).unwrap();
        assert!(report.passed(), "{}", report);

        let analytic = option.price_volatility_parameter_sensitivity(&provider).unwrap();
        let numerical = FiniteDifferenceModelCalculator::from_config(&config)
            .unwrap()
            .calculate(&provider, |p| option.price(p))
            .unwrap();
        let report = compare_parameter_sensitivities(&analytic, &numerical, &config.tolerance());
        assert!(report.passed(), "{}", report);
        assert_eq!(report.checked, provider.volatility().parameters().len());
    }
}

#[test]
fn test_normal_margin_position_risk_on_annual_curves() {
    let config = config();
    let index = RateIndex::new("GBP-LIBOR-3M", Currency::GBP);
    let times = [0.25, 0.5, 1.0, 2.0, 5.0];
    let curves = MulticurveProvider::new()
        .with_discount_curve(
            Currency::GBP,
            "GBP-DSC",
            InterpolatedCurve::periodic(&times, &[0.0040, 0.0045, 0.0055, 0.0075, 0.0110], 1).unwrap(),
        )
        .with_forward_curve(
            index.clone(),
            "GBP-FWD3M",
            InterpolatedCurve::periodic(&times, &[0.0060, 0.0066, 0.0078, 0.0098, 0.0135], 1).unwrap(),
        );
    let provider = BlackFuturesProvider::new(curves, normal_surface(true));
    let future = InterestRateFutureSecurity::new("LZ6", index, 1.0, 1.0, 1.25, 0.25, 500_000.0, 0.25).unwrap();
    let option = FuturesOptionMarginSecurity::new(future, 0.75, 0.9925, false).unwrap();
    let quantity: i64 = 1_000;
    let trade = FuturesOptionMarginTransaction::new(option.clone(), quantity, 0.0015);
    let scale = 500_000.0 * 0.25 * quantity as f64;

    let point = option
        .price_curve_sensitivity_with_smile(&provider)
        .unwrap()
        .multiplied_by(scale);
    let pv01 = Pv01Calculator::new().calculate(&point, provider.curves()).unwrap();
    let fd = FiniteDifferenceCurveCalculator::from_config(&config).unwrap();
    let parallel = fd
        .calculate_parallel(&provider, "GBP-FWD3M", |p| trade.present_value(p))
        .unwrap();
    assert!((pv01["GBP-FWD3M"] - parallel * BASIS_POINT).abs() < 1e-4 * parallel.abs() * BASIS_POINT);
    assert!(!pv01.contains_key("GBP-DSC"));

    let buckets = Pv01Calculator::new().bucketed(&point, provider.curves()).unwrap();
    let numerical = fd
        .calculate_curve(&provider, "GBP-FWD3M", |p| trade.present_value(p))
        .unwrap();
    for (analytic, numerical) in buckets.get("GBP-FWD3M").unwrap().iter().zip(numerical) {
        assert!((analytic - numerical * BASIS_POINT).abs() < 1e-3 + 1e-4 * analytic.abs());
    }

    assert_eq!(
        trade.position_vega(&provider).unwrap(),
        option.vega(&provider).unwrap() * scale
    );
    assert!(trade.position_gamma(&provider).unwrap() > 0.0);
}

#[test]
fn test_market_quote_sensitivity_is_linear_in_jacobian() {
    let jacobian: Vec<Vec<f64>> = (0..7)
        .map(|i| (0..7).map(|j| if i == j { 1.0 } else if i == j + 1 { 0.5 } else { 0.0 }).collect())
        .collect();
    let curves = curves()
        .with_jacobian(FWD, CurveJacobian::new(jacobian).unwrap())
        .unwrap();
    let point = stir().futures_price_curve_sensitivity(&curves).unwrap();
    let parameters = bucketed(&point, &curves);
    let quotes = MarketQuoteSensitivityCalculator::new()
        .from_parameter_sensitivity(&parameters, &curves)
        .unwrap();

    let p = parameters.get(FWD).unwrap();
    let q = quotes.get(FWD).unwrap();
    for j in 0..6 {
        assert!((q[j] - (p[j] + 0.5 * p[j + 1])).abs() < 1e-14);
    }
    assert_eq!(q[6], p[6]);
    assert!(curves.jacobian(DSC).is_none());
}

#[test]
fn test_evaluator_error_is_propagated() {
    let calc = FiniteDifferenceCurveCalculator::default();
    let result = calc.calculate(&curves(), |_: &MulticurveProvider| {
        Err::<f64, _>(PricingError::ModelFailure("no price".into()))
    });
    assert!(result.is_err());
}
