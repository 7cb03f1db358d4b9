mod args;
mod entry;

use apiprobe::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
