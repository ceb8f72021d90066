// Heavy computation without blocking the async runtime
async fn count_primes(limit: u64) -> Result<u64, tokio::task::JoinError> {
    // CPU-bound work goes to the blocking pool so other tasks keep running
    tokio::task::spawn_blocking(move || {
        (2..limit).filter(|n| is_prime(*n)).count() as u64
    })
    .await
}

fn is_prime(n: u64) -> bool {
    (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

#[tokio::main]
async fn main() {
    let count = count_primes(10_000).await.unwrap_or(0);
    println!("found {count} primes"); // 1229
}
