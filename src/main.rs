fn main() -> anyhow::Result<()> {
    macro_recorder_lib::run()
}
