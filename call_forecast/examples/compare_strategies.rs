use call_forecast::eda::Eda;
use call_forecast::pipeline::evaluate_seasonal;
use call_forecast::{compare_strategies, init_tracing, DataTank, ErrorLog, PredictorConfig};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(data_path) = args.next() else {
        eprintln!("usage: compare_strategies <calls.csv> [config.json]");
        std::process::exit(2);
    };
    let config = match args.next() {
        Some(path) => PredictorConfig::from_json_file(path)?,
        None => PredictorConfig::default(),
    };
    init_tracing(&config.logging);

    println!("Call Arrival Forecasting: Strategy Comparison");
    println!("=============================================\n");

    let log = ErrorLog::default();
    let mut tank = DataTank::new().with_bands(config.bands).with_log(log.clone());
    tank.load_data(&data_path)?;
    let full = tank.process_data()?;

    let eda = Eda::new(&full);
    println!("{} calls over {} days", full.len(), eda.each_day_call_count().len());
    if let Ok(summary) = eda.each_day_call_count_description() {
        println!("Calls per day:\n{}\n", summary);
    }

    let (train, test) = tank.train_test_split(config.split_ratio)?;
    println!("Train: {} rows, test: {} rows\n", train.len(), test.len());

    for report in compare_strategies(&config, &log, &train, &test) {
        println!("{}", report);
    }

    match evaluate_seasonal(&config, &log, &full) {
        Ok(report) => println!("{}", report),
        Err(err) => println!("Seasonal skipped: {}", err),
    }

    Ok(())
}
