mod common;

use approx::assert_relative_eq;
use call_forecast::config::{PredictorConfig, SequenceConfig};
use call_forecast::logging::{LogLevel, MemorySink};
use call_forecast::strategies::{
    DoubleSmoothingForecast, HourlyIntervalAverageForecast, SequenceForecast,
    SimpleAverageForecast, SmoothingForecast, TimeSeriesForecast,
};
use call_forecast::{
    compare_strategies, evaluate_strategy, CallLog, ErrorLog, ForecastError, ForecastStrategy,
    StrategyKind, ValidationMetric,
};
use call_math::MathError;
use common::{hourly_calls, process, raw_call};
use std::collections::HashSet;

fn workday_split() -> (CallLog, CallLog) {
    let log = process(hourly_calls(4..=9, &[7, 9, 10, 12, 13, 15, 17, 18, 20, 22]));
    let cut = 40;
    (log.slice(0..cut).unwrap(), log.slice(cut..log.len()).unwrap())
}

#[test]
fn test_simple_average_predicts_the_training_mean() {
    let (train, test) = workday_split();
    let mut model = SimpleAverageForecast::new().with_log(ErrorLog::muted());
    model.fit(&train).unwrap();

    let expected = train.intervals().iter().sum::<f64>() / train.len() as f64;
    let predicted = model.predict(&test).unwrap();

    assert_eq!(predicted.len(), test.len());
    for value in predicted.intervals() {
        assert_relative_eq!(value, expected, epsilon = 1e-9);
    }
    // Everything except the interval column is carried over
    assert_eq!(predicted.records()[0].call_arrival_time, test.records()[0].call_arrival_time);
}

#[test]
fn test_hourly_average_looks_up_each_weekday() {
    // Monday 4th, Tuesday 5th and Wednesday 6th train; the test adds a Thursday
    let train = process(vec![
        raw_call(4, 8, 0, 30.0),
        raw_call(4, 9, 0, 40.0),
        raw_call(4, 10, 0, 60.0),
        raw_call(5, 8, 0, 50.0),
        raw_call(5, 9, 0, 90.0),
        raw_call(6, 8, 0, 10.0),
        raw_call(6, 9, 0, 16.0),
        raw_call(6, 10, 0, 30.0),
    ]);
    let test = process(vec![
        raw_call(11, 8, 0, 1.0),
        raw_call(12, 8, 0, 1.0),
        raw_call(14, 8, 0, 1.0),
    ]);

    let sink = MemorySink::new();
    let mut model = HourlyIntervalAverageForecast::new().with_log(ErrorLog::new(sink.clone()));
    model.fit(&train).unwrap();

    let predicted = model.predict(&test).unwrap().intervals();
    assert_eq!(predicted, vec![20.0, 45.0, 22.5]);

    let debug = sink.entries_at(LogLevel::Debug);
    assert_eq!(debug.len(), 1);
    assert!(debug[0].message.contains("Thursday"));
}

#[test]
fn test_smoothing_strategies_forecast_every_test_row() {
    let (train, test) = workday_split();

    let mut single = SmoothingForecast::new(0.6).with_log(ErrorLog::muted());
    single.fit(&train).unwrap();
    let flat = single.predict(&test).unwrap().intervals();
    assert_eq!(flat.len(), test.len());
    assert!(flat.windows(2).all(|w| w[0] == w[1]));

    let mut double = DoubleSmoothingForecast::new(0.365, 1e-7).with_log(ErrorLog::muted());
    double.fit(&train).unwrap();
    let trend = double.predict(&test).unwrap().intervals();
    assert_eq!(trend.len(), test.len());
    assert!(trend.iter().all(|v| v.is_finite()));
}

#[test]
fn test_time_series_predicts_one_step_ahead() {
    let (train, test) = workday_split();

    let mut plain = TimeSeriesForecast::new(500).with_log(ErrorLog::muted());
    plain.fit(&train).unwrap();
    let predicted = plain.predict(&test).unwrap();
    assert_eq!(predicted.len(), test.len());
    assert!(predicted.intervals().iter().all(|v| v.is_finite()));

    let model = plain.model().unwrap();
    assert!(model.ar.abs() < 1.0 && model.ma.abs() < 1.0);

    let mut leaky = TimeSeriesForecast::new(500)
        .with_log(ErrorLog::muted())
        .with_holdout(test.clone());
    leaky.fit(&train).unwrap();
    assert_eq!(leaky.predict(&test).unwrap().len(), test.len());
    assert!(leaky.describe().contains("train+holdout"));
    assert!(plain.describe().contains(" on train:"));
}

#[test]
fn test_sequence_model_trains_and_predicts() {
    let (train, test) = workday_split();
    let config = SequenceConfig {
        epochs: 30,
        ..SequenceConfig::default()
    };

    let mut model = SequenceForecast::new(config).with_log(ErrorLog::muted());
    model.fit(&train).unwrap();
    assert!(model.final_loss().unwrap().is_finite());

    let predicted = model.predict(&test).unwrap().intervals();
    assert_eq!(predicted.len(), test.len());
    assert!(predicted.iter().all(|v| v.is_finite()));
}

#[test]
fn test_failed_fit_leaves_strategy_unfitted() {
    let sink = MemorySink::new();
    let mut model = SimpleAverageForecast::new().with_log(ErrorLog::new(sink.clone()));

    assert!(model.fit(&CallLog::default()).is_err());
    assert!(!model.is_fitted());

    let errors = sink.entries_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Unable to train model");

    assert!(matches!(
        model.predict(&CallLog::default()),
        Err(ForecastError::NotFitted(_))
    ));
    assert_eq!(sink.entries_at(LogLevel::Error).len(), 2);
}

#[test]
fn test_metric_shapes() {
    let actual = [10.0, 12.0, 9.0, 15.0];
    let predicted = [11.0, 12.0, 7.0, 15.5];

    let mse = ValidationMetric::mean_squared_error(&actual, &predicted).unwrap();
    let rmse = ValidationMetric::root_mean_squared_error(&actual, &predicted).unwrap();
    assert_relative_eq!(rmse * rmse, mse, epsilon = 1e-12);

    assert!(matches!(
        ValidationMetric::mean_squared_error(&actual, &predicted[..3]),
        Err(ForecastError::MathError(MathError::LengthMismatch { .. }))
    ));
    assert!(ValidationMetric::root_mean_squared_error(&[], &[]).is_err());

    let (train, test) = workday_split();
    assert!(matches!(
        test.with_intervals(&[1.0]),
        Err(ForecastError::ShapeMismatch { .. })
    ));
    assert!(ValidationMetric::evaluate_logs(&train, &test).is_err());
}

#[test]
fn test_compare_every_strategy() {
    let (train, test) = workday_split();
    let mut config = PredictorConfig::default();
    config.sequence.epochs = 30;
    config.time_series.max_iter = 300;

    let reports = compare_strategies(&config, &ErrorLog::muted(), &train, &test);
    assert_eq!(reports.len(), StrategyKind::ALL.len());

    let names: HashSet<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names.len(), reports.len());
    for report in &reports {
        assert_eq!(report.points, test.len());
        assert!(report.mse >= 0.0);
        assert_relative_eq!(report.rmse * report.rmse, report.mse, max_relative = 1e-9);
    }

    let single = evaluate_strategy(
        StrategyKind::SimpleAverage,
        &config,
        &ErrorLog::muted(),
        &train,
        &test,
    )
    .unwrap();
    assert_eq!(single, reports[0]);
}
