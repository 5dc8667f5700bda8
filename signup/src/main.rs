use formwork::FormConfig;
use formwork::notify::Scheduler;
use log::info;
use signup::SignupForm;
use signup::logging::LogSettings;

/// Runs a short scripted session and prints the saved value.
async fn run() -> signup::Result<()> {
    LogSettings::from_env()?.init()?;

    let scheduler = Scheduler::new();
    let form = SignupForm::new(&scheduler, FormConfig::default())?;

    form.populate_test_data();
    form.email().set_value("rbcadaing@gmail");
    form.email().set_value("rbcadaing@gmail.com");
    form.confirm_email().set_value("rbcadaing@gmail.com");
    form.set_notification("text");
    form.phone().set_value("555-0100");
    form.rating().set_value(4);
    form.toggle_send_catalog();
    form.add_address();

    scheduler.run_until_idle().await;
    info!("Email message: {:?}", form.email_message());

    let result = form.validate();
    for error in result.errors() {
        info!("{}: {}", error.path, error.message);
    }

    println!("{}", form.save());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
    }
}
