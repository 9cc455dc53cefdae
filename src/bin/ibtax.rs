fn main() {
    ibtax::cmd::command_main()
}
