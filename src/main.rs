use loadmix::error::AppResult;

fn main() -> AppResult<()> {
    loadmix::entry::run()
}
