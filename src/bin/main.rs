fn main() {
  doge20::main();
}
