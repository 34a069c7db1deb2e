mod support;
mod test_end_to_end;
mod test_rendering;
mod test_run_once;
