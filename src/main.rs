//! Documentation example: build a payment transaction through the preprod
//! service and print whatever JSON it returns. One request per run, no
//! retries; any network or parse failure ends the process.

use anvil_txbuild::{AnvilClient, ApiError, TxBuildRequest};
use sonic_rs::Value;

const SENDER_ADDRESS: &str = "addr_test1qrydyk6uw6cehk5u3zspyz3dhnwzmhfls2fp42vv5dv9g2z3885pg4kpkn30ptezc855lu3w5ey93zcr5lrezjmwkftqg8xvge";
const RECEIVER_ADDRESS: &str = "addr_test1qr0tkwvlln0v5fljdxceudmlpt5y6szc84vpj4skm836tgn4hsqaesgg97l8ppy5rsn0alj8pth6lqe20fdyydsdgw6sr74cyt";
const LOVELACE_AMOUNT: u64 = 10_000_000;

// Public testnet placeholder; swap in your own key.
const API_KEY: &str = "testnet_EyrkvCWDZqjkfLSe1pxaF0hXxUcByHEhHuXIBjt9";

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let request =
        TxBuildRequest::new(SENDER_ADDRESS).with_output(RECEIVER_ADDRESS, LOVELACE_AMOUNT);

    let client = AnvilClient::new(API_KEY);
    let built: Value = client.build_transaction(&request).await?;

    println!(
        "{}",
        sonic_rs::to_string_pretty(&built).map_err(ApiError::from_json)?
    );

    Ok(())
}
