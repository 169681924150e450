use sadhana_core::round::ROUND;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&ROUND)?);
    Ok(())
}
