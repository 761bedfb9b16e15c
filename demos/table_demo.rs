use bucket_hash::DefaultStrategy;
use bucket_hash::HashSet;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// Number of distinct values to insert.
    #[arg(short = 'n', long = "count", default_value_t = 20)]
    count: u64,

    /// Initial number of table slots.
    #[arg(short = 'c', long = "capacity", default_value_t = 16)]
    capacity: usize,

    /// Initial length of each bucket.
    #[arg(short = 'b', long = "bucket_capacity", default_value_t = 8)]
    bucket_capacity: usize,

    /// Remove every other value after filling the set.
    #[arg(long = "thin")]
    thin: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut set: HashSet<u64> = HashSet::with_capacity_and_strategy(
        args.capacity,
        args.bucket_capacity,
        DefaultStrategy::default(),
    );
    println!(
        "Created set with {} buckets (grows at {} elements)",
        set.capacity(),
        set.threshold()
    );

    for value in 0..args.count {
        set.insert(value);
    }
    println!("Inserted {} values", set.len());

    if args.thin {
        set.retain(|v| v % 2 == 0);
        println!("Retained {} even values", set.len());
    }

    println!("{}", set);
    print!("{}", set.to_table_string());
    set.debug_stats().print();
}
