//! Tour of the spark API: the default logger, custom loggers, context
//! fields and file output.
//!
//! Run with `cargo run --example simple`.

use spark::{Field, Format, Level, Logger, WriterSink};
use std::error::Error;
use std::io;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: Using the default logger
    spark::info("This is an info message using default logger", &[]);
    spark::warn(
        "This is a warning message",
        &[Field::string("component", "example")],
    );
    let example_error = io::Error::other("example error");
    spark::error("This is an error message", &[Field::err(&example_error)]);

    // Example 2: Creating a custom logger with JSON format
    let json_logger = Logger::builder()
        .format(Format::Json)
        .level(Level::Debug)
        .build()?;

    json_logger.debug("Debug message in JSON format", &[]);
    json_logger.info(
        "Info message with fields",
        &[
            Field::string("user", "john"),
            Field::int("age", 30),
            Field::bool("active", true),
        ],
    );

    // Example 3: Using context logger with fields
    let context_logger = spark::with([
        Field::string("service", "user-service"),
        Field::string("version", "1.0.0"),
    ]);

    context_logger.info(
        "Processing user request",
        &[Field::string("user_id", "12345"), Field::string("action", "login")],
    );

    // Example 4: Creating a logger with file output
    let file_logger = Logger::builder()
        .output(Arc::new(WriterSink::append_file("app.log")?))
        .format(Format::Json)
        .caller(true)
        .build()?;

    file_logger.info(
        "This message will be written to app.log",
        &[Field::string("destination", "file"), Field::int("line_number", 42)],
    );
    file_logger.sync()?;

    // Example 5: Different log levels
    let logger = Logger::builder()
        .level(Level::Info)
        .format(Format::Console)
        .build()?;

    logger.debug("This debug message won't be shown (level is Info)", &[]);
    logger.info("This info message will be shown", &[]);
    logger.warn("This warning message will be shown", &[]);
    logger.error("This error message will be shown", &[]);

    // Example 6: Using structured logging for better observability
    let user_logger = spark::with([
        Field::string("module", "user"),
        Field::string("function", "create_user"),
    ]);

    user_logger.info(
        "Starting user creation process",
        &[Field::string("email", "user@example.com"), Field::string("role", "admin")],
    );

    user_logger.debug("Validating user input", &[]);
    user_logger.debug("Checking if user exists", &[]);

    user_logger.info(
        "User created successfully",
        &[Field::string("user_id", "user_123"), Field::int64("created_at", 1640995200)],
    );

    // Flush before exiting; nothing is flushed automatically
    if let Err(err) = spark::sync() {
        spark::error("Failed to sync logger", &[Field::err(&err)]);
    }

    Ok(())
}
