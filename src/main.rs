use anyhow::Result;

fn main() -> Result<()> {
    stock_query::run()
}
